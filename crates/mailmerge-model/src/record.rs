use serde::{Deserialize, Serialize};

use crate::FieldMapping;

/// How output ordinals are assigned to the records of one sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrdinalPolicy {
    /// 1-based position among the rows that were actually yielded; skipped rows do not consume
    /// an ordinal.
    #[default]
    Yielded,
    /// 1-based position among all data rows of the sheet, skipped or not.
    SourceRow,
}

/// One qualifying data row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Worksheet name the row was read from.
    pub sheet: String,
    /// Output ordinal within the sheet (see [`OrdinalPolicy`]).
    pub ordinal: u32,
    /// 1-based worksheet row number.
    pub row: u32,
    pub fields: FieldMapping,
}

impl Record {
    /// Output file stem: `{sheet}_output_{ordinal}`.
    ///
    /// The stem is always a single file name: path separators, `:*?"<>|` and control
    /// characters in the sheet name become `_`.
    pub fn file_stem(&self) -> String {
        format!("{}_output_{}", file_name_safe(&self.sheet), self.ordinal)
    }
}

fn file_name_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_is_namespaced_by_sheet() {
        let record = Record {
            sheet: "Sheet2".to_string(),
            ordinal: 3,
            row: 9,
            fields: FieldMapping::new(),
        };
        assert_eq!(record.file_stem(), "Sheet2_output_3");
    }

    #[test]
    fn file_stem_never_contains_path_separators() {
        let stem = |sheet: &str| {
            Record {
                sheet: sheet.to_string(),
                ordinal: 1,
                row: 5,
                fields: FieldMapping::new(),
            }
            .file_stem()
        };
        assert_eq!(stem("../x"), ".._x_output_1");
        assert_eq!(stem("a/b"), "a_b_output_1");
        assert_eq!(stem("..\\..\\evil"), ".._.._evil_output_1");
        assert_eq!(stem("Q1: \"West\"?"), "Q1_ _West___output_1");
        assert_eq!(stem("tab\there"), "tab_here_output_1");
        assert_eq!(stem("Kunden & Preise"), "Kunden & Preise_output_1");
    }

    #[test]
    fn ordinal_policy_parses_kebab_case() {
        let policy: OrdinalPolicy = serde_json::from_str(r#""source-row""#).unwrap();
        assert_eq!(policy, OrdinalPolicy::SourceRow);
        assert_eq!(OrdinalPolicy::default(), OrdinalPolicy::Yielded);
    }
}
