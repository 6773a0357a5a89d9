//! CLI argument definitions for the synoptic report encoder.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use synoptic_model::ReportType;

#[derive(Parser)]
#[command(
    name = "synoptic",
    version,
    about = "Synoptic report encoder - turn OCR'd clinical reports into coded rows",
    long_about = "Extract the synoptic section of operative or pathology reports,\n\
                  map its fields onto a canonical schema and encode every value\n\
                  against a code book. One invocation handles one report type."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow report text and extracted values in trace logs.
    ///
    /// Reports carry patient information; without this flag such values are
    /// logged as `[REDACTED]`.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a folder of reports of one type.
    Run(Box<RunArgs>),

    /// List the registered value transforms.
    Transforms,
}

#[derive(Args)]
pub struct RunArgs {
    /// Folder holding one text file per report (`<number>_<name>.txt`).
    #[arg(value_name = "REPORTS_DIR")]
    pub reports_dir: PathBuf,

    /// Report family of every file in the folder.
    #[arg(long = "report-type", value_enum)]
    pub report_type: ReportTypeArg,

    /// Output directory for the CSV files (default: <REPORTS_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run options in TOML; flags below override it.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub inputs: InputArgs,

    /// Lowest report number to process.
    #[arg(long = "start", value_name = "N")]
    pub start: Option<u64>,

    /// Highest report number to process.
    #[arg(long = "end", value_name = "N")]
    pub end: Option<u64>,

    /// Only process files whose stem ends with this text (e.g. `_path`).
    #[arg(long = "report-ending", value_name = "TEXT")]
    pub report_ending: Option<String>,

    /// Disable label auto-correction in the normalizer.
    #[arg(long = "no-autocorrect")]
    pub no_autocorrect: bool,

    /// Training mode: accept weaker code-book matches.
    #[arg(long = "training")]
    pub training: bool,

    /// Close OCR intra-word spaces before isolating sections.
    ///
    /// Needs `--frequency-list` or `--word-list`.
    #[arg(long = "ocr-repair")]
    pub ocr_repair: bool,

    /// Leave reports without a synoptic section out of the CSV rows.
    #[arg(long = "only-synoptic")]
    pub only_synoptic: bool,
}

/// Startup files.
#[derive(Args)]
pub struct InputArgs {
    /// Schema CSV or XLSX (`primary`, `alternative`, `canonical`, `zero_empty`).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Code book CSV or XLSX (`canonical_column`, `code`, `synonyms`).
    #[arg(long = "code-book", value_name = "PATH")]
    pub code_book: PathBuf,

    /// Per-column similarity thresholds; a template is written when missing.
    #[arg(long = "thresholds", value_name = "PATH")]
    pub thresholds: Option<PathBuf>,

    /// Per-column capture rules; a template is written when missing.
    #[arg(long = "regex-rules", value_name = "PATH")]
    pub regex_rules: Option<PathBuf>,

    /// `(raw_label, canonical)` pairs the normalizer must not rewrite.
    #[arg(long = "exclusions", value_name = "PATH")]
    pub exclusions: Option<PathBuf>,

    /// TNM category table used by stage repair.
    #[arg(long = "categories", value_name = "PATH")]
    pub categories: Option<PathBuf>,

    /// `word,count` list of domain words for OCR repair.
    #[arg(long = "frequency-list", value_name = "PATH")]
    pub frequency_list: Option<PathBuf>,

    /// Dictionary, one word per line, for OCR repair.
    #[arg(long = "word-list", value_name = "PATH")]
    pub word_list: Option<PathBuf>,

    /// TOML override of the section anchors.
    #[arg(long = "section-rules", value_name = "PATH")]
    pub section_rules: Option<PathBuf>,
}

/// CLI report type choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum ReportTypeArg {
    /// Operative reports.
    Alpha,
    /// Pathology reports.
    Numeric,
}

impl From<ReportTypeArg> for ReportType {
    fn from(arg: ReportTypeArg) -> Self {
        match arg {
            ReportTypeArg::Alpha => ReportType::Alpha,
            ReportTypeArg::Numeric => ReportType::Numeric,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
