//! The merge loop: one fresh template instance per qualifying record.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mailmerge_docx::{DocxError, TemplatePackage};
use mailmerge_fs::{atomic_write, prepare_output_dir, AtomicWriteError};
use mailmerge_model::Record;
use mailmerge_xlsx::{ReadError, Workbook};
use serde::Serialize;
use thiserror::Error;

use crate::archive::{write_archive, ArchiveError};
use crate::config::{FailurePolicy, MergeConfig};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to read data source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: ReadError,
    },
    #[error("failed to load template {path}: {source}")]
    TemplateParse {
        path: PathBuf,
        #[source]
        source: DocxError,
    },
    #[error("failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: AtomicWriteError<DocxError>,
    },
    #[error("failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },
    #[error("merge exceeded its {limit:?} deadline after {generated} documents")]
    DeadlineExceeded { limit: Duration, generated: usize },
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A record whose document could not be produced under [`FailurePolicy::Continue`].
#[derive(Clone, Debug, Serialize)]
pub struct RecordFailure {
    pub sheet: String,
    pub ordinal: u32,
    pub row: u32,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct MergeOutcome {
    /// Written documents, in encounter order (sheets, then rows).
    pub generated: Vec<PathBuf>,
    pub failures: Vec<RecordFailure>,
    /// Rows rejected by the required-field policy.
    pub skipped: usize,
    pub archive: Option<PathBuf>,
}

impl MergeOutcome {
    /// No document was produced. Not an error by itself; callers decide how to report it.
    pub fn is_empty(&self) -> bool {
        self.generated.is_empty()
    }
}

pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run the merge.
    ///
    /// Every worksheet is read before the first document is written. A fatal error after that
    /// point removes the documents this run already wrote.
    pub fn run(&self) -> Result<MergeOutcome, MergeError> {
        let config = &self.config;
        config.validate()?;
        let started = Instant::now();

        let template = TemplatePackage::open(&config.template_source).map_err(|source| {
            MergeError::TemplateParse {
                path: config.template_source.clone(),
                source,
            }
        })?;
        let source_error = |source| MergeError::SourceRead {
            path: config.data_source.clone(),
            source,
        };
        let workbook = Workbook::open(&config.data_source).map_err(source_error)?;
        let mut reader = workbook.records(config.reader_options());
        let records = reader
            .by_ref()
            .collect::<Result<Vec<Record>, _>>()
            .map_err(source_error)?;
        let skipped = reader.skipped();

        prepare_output_dir(&config.output_dir).map_err(|err| MergeError::Persistence {
            path: config.output_dir.clone(),
            source: AtomicWriteError::Io(err),
        })?;

        let mut outcome = MergeOutcome {
            skipped,
            ..MergeOutcome::default()
        };
        if let Err(err) = self.render_all(&template, records, started, &mut outcome) {
            discard(&outcome.generated);
            return Err(err);
        }

        log::info!(
            "generated {} documents ({} skipped rows, {} failures) in {:?}",
            outcome.generated.len(),
            outcome.skipped,
            outcome.failures.len(),
            started.elapsed()
        );
        Ok(outcome)
    }

    fn render_all(
        &self,
        template: &TemplatePackage,
        records: Vec<Record>,
        started: Instant,
        outcome: &mut MergeOutcome,
    ) -> Result<(), MergeError> {
        let config = &self.config;
        let extension = config.output_extension();

        for record in records {
            if let Some(limit) = config.timeout() {
                if started.elapsed() >= limit {
                    return Err(MergeError::DeadlineExceeded {
                        limit,
                        generated: outcome.generated.len(),
                    });
                }
            }

            let path = config
                .output_dir
                .join(format!("{}.{extension}", record.file_stem()));
            if path.parent() != Some(config.output_dir.as_path()) {
                return Err(MergeError::Persistence {
                    source: AtomicWriteError::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "output path leaves the output directory",
                    )),
                    path,
                });
            }

            match self.render(template, &record, &path) {
                Ok(()) => outcome.generated.push(path),
                Err(err) if config.failure_policy == FailurePolicy::Continue => {
                    log::warn!("{}!row {}: {err}", record.sheet, record.row);
                    outcome.failures.push(RecordFailure {
                        sheet: record.sheet,
                        ordinal: record.ordinal,
                        row: record.row,
                        path,
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(archive) = &config.archive {
            if outcome.is_empty() {
                log::info!("no documents generated; not writing {}", archive.display());
            } else {
                let entries = write_archive(&outcome.generated, archive).map_err(|source| {
                    MergeError::Archive {
                        path: archive.clone(),
                        source,
                    }
                })?;
                log::info!("archived {entries} documents into {}", archive.display());
                outcome.archive = Some(archive.clone());
            }
        }
        Ok(())
    }

    /// Instantiate, substitute and persist the document for one record.
    fn render(
        &self,
        template: &TemplatePackage,
        record: &Record,
        path: &Path,
    ) -> Result<(), MergeError> {
        let template_error = |source| MergeError::TemplateParse {
            path: self.config.template_source.clone(),
            source,
        };
        let mut document = template
            .instantiate(self.config.stories())
            .map_err(template_error)?;
        let stats = document
            .merge(&record.fields, self.config.rewrite_policy)
            .map_err(template_error)?;
        log::debug!(
            "{}!row {} -> {}: {} of {} paragraphs substituted",
            record.sheet,
            record.row,
            path.display(),
            stats.substituted,
            stats.paragraphs
        );

        atomic_write(path, |file| document.write_to(file).map(|_| ())).map_err(|source| {
            MergeError::Persistence {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// Remove documents written before a fatal error.
fn discard(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("removed {}", path.display()),
            Err(err) => log::warn!("could not remove {}: {err}", path.display()),
        }
    }
}
