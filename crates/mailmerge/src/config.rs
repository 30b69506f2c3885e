use std::path::{Path, PathBuf};
use std::time::Duration;

use mailmerge_docx::{RewritePolicy, Stories};
use mailmerge_model::{OrdinalPolicy, RequiredFields};
use mailmerge_xlsx::{ReaderOptions, DEFAULT_HEADER_ROW, MAX_ROW};
use serde::{Deserialize, Serialize};

use crate::MergeError;

/// What happens when one generated document cannot be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// The first failure ends the merge.
    #[default]
    Abort,
    /// Log the failure, record it in the outcome and move on to the next record.
    Continue,
}

/// Everything a merge run needs. Loadable from JSON; missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// DOCX template with `{Field}` placeholders.
    pub template_source: PathBuf,
    /// XLSX workbook holding the records.
    pub data_source: PathBuf,
    /// Directory receiving `{sheet}_output_{ordinal}.{ext}` files; created if missing.
    pub output_dir: PathBuf,
    /// Zip bundling every generated document, written after the merge.
    pub archive: Option<PathBuf>,
    pub header_row: u32,
    pub required_fields: RequiredFields,
    pub ordinal_policy: OrdinalPolicy,
    pub rewrite_policy: RewritePolicy,
    pub failure_policy: FailurePolicy,
    /// Also substitute into the headers and footers the template references.
    pub headers_footers: bool,
    /// Abort once the merge has been running this long, checked before each record.
    pub timeout_secs: Option<u64>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            template_source: PathBuf::new(),
            data_source: PathBuf::new(),
            output_dir: PathBuf::new(),
            archive: None,
            header_row: DEFAULT_HEADER_ROW,
            required_fields: RequiredFields::default(),
            ordinal_policy: OrdinalPolicy::default(),
            rewrite_policy: RewritePolicy::default(),
            failure_policy: FailurePolicy::default(),
            headers_footers: false,
            timeout_secs: None,
        }
    }
}

impl MergeConfig {
    pub fn new(
        template_source: impl Into<PathBuf>,
        data_source: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template_source: template_source.into(),
            data_source: data_source.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MergeError> {
        serde_json::from_str(json).map_err(|err| MergeError::Config(err.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MergeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| MergeError::Config(format!("read {}: {err}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|err| MergeError::Config(format!("{}: {err}", path.display())))
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        for (key, path) in [
            ("template_source", &self.template_source),
            ("data_source", &self.data_source),
            ("output_dir", &self.output_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(MergeError::Config(format!("{key} is not set")));
            }
        }
        if !(1..=MAX_ROW).contains(&self.header_row) {
            return Err(MergeError::Config(format!(
                "header_row must be between 1 and {MAX_ROW}, got {}",
                self.header_row
            )));
        }
        Ok(())
    }

    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            header_row: self.header_row,
            required_fields: self.required_fields.clone(),
            ordinal_policy: self.ordinal_policy,
        }
    }

    pub fn stories(&self) -> Stories {
        if self.headers_footers {
            Stories::BodyAndHeadersFooters
        } else {
            Stories::Body
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Extension for generated files, taken from the template (`docx` when it has none).
    pub fn output_extension(&self) -> String {
        self.template_source
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "docx".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_fills_in_defaults() {
        let config = MergeConfig::from_json_str(
            r#"{
                "template_source": "uploads/letter.docx",
                "data_source": "uploads/customers.xlsx",
                "output_dir": "outputs",
                "required_fields": ["Email"],
                "ordinal_policy": "source-row",
                "failure_policy": "continue"
            }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            MergeConfig {
                required_fields: RequiredFields::new(["Email"]),
                ordinal_policy: OrdinalPolicy::SourceRow,
                failure_policy: FailurePolicy::Continue,
                ..MergeConfig::new("uploads/letter.docx", "uploads/customers.xlsx", "outputs")
            }
        );
        assert_eq!(config.header_row, 4);
        assert_eq!(config.output_extension(), "docx");
        config.validate().unwrap();
    }

    #[test]
    fn unknown_keys_and_missing_paths_are_config_errors() {
        assert!(matches!(
            MergeConfig::from_json_str(r#"{"template": "a.docx"}"#),
            Err(MergeError::Config(_))
        ));
        assert!(matches!(
            MergeConfig::new("a.docx", "", "out").validate(),
            Err(MergeError::Config(msg)) if msg.contains("data_source")
        ));
        let zero_header = MergeConfig {
            header_row: 0,
            ..MergeConfig::new("a.docx", "b.xlsx", "out")
        };
        assert!(zero_header.validate().is_err());
        let past_last_row = MergeConfig {
            header_row: u32::MAX,
            ..MergeConfig::new("a.docx", "b.xlsx", "out")
        };
        assert!(matches!(
            past_last_row.validate(),
            Err(MergeError::Config(msg)) if msg.contains("1048576")
        ));
        let last_row = MergeConfig {
            header_row: MAX_ROW,
            ..MergeConfig::new("a.docx", "b.xlsx", "out")
        };
        last_row.validate().unwrap();
    }
}
