//! CLI argument parsing for guardminer

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format of the mined ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated table (default)
    Csv,
    /// JSON document for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "guardminer")]
#[command(version)]
#[command(
    about = "Mine API compatibility rules from SDK version checks in app histories",
    long_about = None
)]
pub struct Cli {
    /// Merged probe table (CSV) or a directory of per-project tab-separated dumps
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination of the ruleset; must not exist yet
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Write one DOT subsumption graph per (operator, threshold) into DIR
    #[arg(short = 'g', long = "graphs", value_name = "DIR")]
    pub graphs: Option<PathBuf>,

    /// API usage table (file or directory of APIs_*.csv) enabling reliability weighting
    #[arg(long = "api-usage", value_name = "PATH")]
    pub api_usage: Option<PathBuf>,

    /// File of regex patterns; matching APIs are ignored
    #[arg(long = "denylist", value_name = "FILE")]
    pub denylist: Option<PathBuf>,

    /// Also write the per-method matched rules to FILE
    #[arg(long = "matched-out", value_name = "FILE")]
    pub matched_out: Option<PathBuf>,

    /// Report supporting apps instead of commit messages
    #[arg(short = 'd', long = "detailed")]
    pub detailed: bool,

    /// Let rules with equal support subsume each other
    #[arg(long = "allow-equal-support")]
    pub allow_equal_support: bool,

    /// TOML configuration file (flags take precedence)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
