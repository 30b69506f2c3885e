use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use mailmerge_docx::RewritePolicy;
use mailmerge_model::{OrdinalPolicy, RequiredFields};
use serde::Serialize;

use crate::{FailurePolicy, MergeConfig, MergeOutcome, Merger};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrdinalArg {
    /// Number the documents of each sheet 1, 2, 3... over the rows actually merged.
    Yielded,
    /// Number by data row position, so skipped rows leave gaps.
    SourceRow,
}

#[derive(Parser)]
#[command(about = "Fill a DOCX template with every qualifying row of an XLSX workbook.")]
pub struct Args {
    /// Template document with `{Field}` placeholders.
    #[arg(long, value_name = "DOCX")]
    template: Option<PathBuf>,

    /// Workbook with one record table per sheet.
    #[arg(long, value_name = "XLSX")]
    data: Option<PathBuf>,

    /// Directory for the generated documents.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// JSON merge configuration. Flags given on the command line override it.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Also bundle the generated documents into this zip.
    #[arg(long, value_name = "ZIP")]
    archive: Option<PathBuf>,

    /// 1-based row holding the field names (default: 4).
    #[arg(long, value_name = "N")]
    header_row: Option<u32>,

    /// Field that must be non-empty for a row to be merged (repeatable; default: Name, Address).
    #[arg(long = "required-field", value_name = "NAME")]
    required_fields: Vec<String>,

    /// How output files are numbered within a sheet.
    #[arg(long, value_enum)]
    ordinal: Option<OrdinalArg>,

    /// Record per-document write failures and keep going instead of aborting.
    #[arg(long)]
    keep_going: bool,

    /// Leave paragraphs without a matching placeholder untouched.
    #[arg(long)]
    preserve_untouched: bool,

    /// Substitute into headers and footers too.
    #[arg(long)]
    headers_footers: bool,

    /// Abort the merge once it has run for this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// More logging on stderr (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    template: String,
    data: String,
    output_dir: String,
    #[serde(flatten)]
    outcome: &'a MergeOutcome,
}

pub fn run() -> Result<()> {
    run_with_args(Args::parse())
}

pub fn run_with_args(args: Args) -> Result<()> {
    init_logging(args.verbose);

    let config = build_config(&args)?;
    let outcome = Merger::new(config.clone()).run()?;

    match args.format {
        OutputFormat::Text => print_text(&config, &outcome),
        OutputFormat::Json => {
            let report = JsonReport {
                template: config.template_source.to_string_lossy().into_owned(),
                data: config.data_source.to_string_lossy().into_owned(),
                output_dir: config.output_dir.to_string_lossy().into_owned(),
                outcome: &outcome,
            };
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer(&mut handle, &report)?;
            handle.write_all(b"\n")?;
        }
    }

    if !outcome.failures.is_empty() {
        anyhow::bail!("{} documents could not be written", outcome.failures.len());
    }
    if outcome.is_empty() {
        anyhow::bail!("no documents produced");
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn build_config(args: &Args) -> Result<MergeConfig> {
    let mut config = match &args.config {
        Some(path) => MergeConfig::from_json_file(path)?,
        None => MergeConfig::default(),
    };

    if let Some(template) = &args.template {
        config.template_source = template.clone();
    }
    if let Some(data) = &args.data {
        config.data_source = data.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(archive) = &args.archive {
        config.archive = Some(archive.clone());
    }
    if let Some(header_row) = args.header_row {
        config.header_row = header_row;
    }
    if !args.required_fields.is_empty() {
        config.required_fields = RequiredFields::new(args.required_fields.iter().cloned());
    }
    if let Some(ordinal) = args.ordinal {
        config.ordinal_policy = match ordinal {
            OrdinalArg::Yielded => OrdinalPolicy::Yielded,
            OrdinalArg::SourceRow => OrdinalPolicy::SourceRow,
        };
    }
    if args.keep_going {
        config.failure_policy = FailurePolicy::Continue;
    }
    if args.preserve_untouched {
        config.rewrite_policy = RewritePolicy::OnlyWhenSubstituted;
    }
    if args.headers_footers {
        config.headers_footers = true;
    }
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }

    config
        .validate()
        .context("pass --template, --data and --output-dir, or a --config file that sets them")?;
    Ok(config)
}

fn print_text(config: &MergeConfig, outcome: &MergeOutcome) {
    println!("Mail merge report");
    println!("  template: {}", config.template_source.display());
    println!("  data: {}", config.data_source.display());
    println!("  output-dir: {}", config.output_dir.display());
    println!(
        "  archive: {}",
        match &outcome.archive {
            Some(path) => path.display().to_string(),
            None => "(none)".to_string(),
        }
    );
    println!();
    println!(
        "Summary: generated={} skipped={} failed={}",
        outcome.generated.len(),
        outcome.skipped,
        outcome.failures.len()
    );
    for path in &outcome.generated {
        println!("  {}", path.display());
    }
    for failure in &outcome.failures {
        println!(
            "  FAILED {}!row {} ({}): {}",
            failure.sheet,
            failure.row,
            failure.path.display(),
            failure.error
        );
    }
}
