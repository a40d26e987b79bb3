//! End-to-end mining run
//!
//! load → denylist → canonicalize → aggregate → subsumption buckets →
//! root reports (optionally weighted) → outputs → DOT export

use crate::aggregate::RuleAggregator;
use crate::cli::OutputFormat;
use crate::config::RulesetConfig;
use crate::corpus::load_corpus;
use crate::csv_output::{MatchedCsvOutput, MatchedRow, RulesetCsvOutput};
use crate::denylist::ApiDenylist;
use crate::error::RulesetError;
use crate::json_output::JsonOutput;
use crate::reliability::ApiUsage;
use crate::ruleset::{collect_ruleset, RulesetEntry};
use crate::subsumption::{build_buckets, export_buckets};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Merged probe table, or a directory of per-project dumps
    pub input: PathBuf,
    /// Ruleset destination; never overwritten
    pub output: PathBuf,
    pub output_format: OutputFormat,
    /// Folder receiving one DOT file per bucket
    pub graphs_dir: Option<PathBuf>,
    /// API usage table enabling reliability weighting
    pub api_usage: Option<PathBuf>,
    /// Extra denylist patterns, one per line
    pub denylist_file: Option<PathBuf>,
    /// Destination of the intermediate matched-rule table
    pub matched_out: Option<PathBuf>,
    pub ruleset: RulesetConfig,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            output_format: OutputFormat::Csv,
            graphs_dir: None,
            api_usage: None,
            denylist_file: None,
            matched_out: None,
            ruleset: RulesetConfig::default(),
        }
    }
}

/// Counters of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub app_versions: usize,
    pub methods: usize,
    pub probes: usize,
    pub skipped_rows: usize,
    pub denied_apis: usize,
    pub matched_rules: usize,
    pub degenerate_rules: usize,
    pub inconsistent_methods: usize,
    pub aggregated_rules: usize,
    pub buckets: usize,
    pub reported_rules: usize,
    pub graph_files: usize,
    pub failed_exports: usize,
}

/// Run the whole mining pipeline
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config
        .ruleset
        .validate()
        .map_err(RulesetError::Config)
        .context("Invalid configuration")?;

    ensure_absent(&config.output)?;
    if let Some(path) = &config.matched_out {
        ensure_absent(path)?;
    }

    let mut denylist = ApiDenylist::from_patterns(config.ruleset.denylist.as_slice())
        .context("Failed to compile configured denylist")?;
    if let Some(path) = &config.denylist_file {
        denylist.extend(
            ApiDenylist::from_file(path)
                .with_context(|| format!("Failed to load denylist {}", path.display()))?,
        );
    }

    let usage = match &config.api_usage {
        Some(path) => Some(
            ApiUsage::load(path)
                .with_context(|| format!("Failed to load API usage {}", path.display()))?,
        ),
        None => None,
    };

    let mut corpus = load_corpus(&config.input)
        .with_context(|| format!("Failed to load probes from {}", config.input.display()))?;

    let mut summary = RunSummary {
        app_versions: corpus.apps.len(),
        methods: corpus.method_count(),
        probes: corpus.probe_count(),
        skipped_rows: corpus.skipped_rows,
        ..RunSummary::default()
    };

    summary.denied_apis = denylist.apply(&mut corpus).total_removed();

    let mut aggregator = RuleAggregator::new();
    let mut matched = config.matched_out.as_ref().map(|_| MatchedCsvOutput::new());

    for app in &corpus.apps {
        for method in &app.methods {
            let outcome = method.canonicalize(&app.app);
            summary.degenerate_rules += outcome.degenerate;
            if outcome.inconsistent.is_some() {
                summary.inconsistent_methods += 1;
            }
            summary.matched_rules += outcome.rules.len();
            aggregator.extend(&outcome.rules);

            if let Some(table) = matched.as_mut() {
                for rule in outcome.rules {
                    table.add_row(MatchedRow {
                        app: app.app.clone(),
                        version: app.version.clone(),
                        sdk_min: app.sdk_min.clone(),
                        method: method.signature.clone(),
                        rule,
                    });
                }
            }
        }
    }
    tracing::info!(
        "Matched {} rules ({} degenerate dropped, {} inconsistent methods)",
        summary.matched_rules,
        summary.degenerate_rules,
        summary.inconsistent_methods
    );

    if let (Some(table), Some(path)) = (&matched, &config.matched_out) {
        write_new(path, &table.to_csv())?;
        tracing::info!("Wrote {} matched rules to {}", table.len(), path.display());
    }

    let aggregated = aggregator.finish();
    summary.aggregated_rules = aggregated.len();

    let mut buckets = build_buckets(aggregated, config.ruleset.graph_options());
    summary.buckets = buckets.len();
    tracing::info!(
        "Aggregated {} rules into {} buckets",
        summary.aggregated_rules,
        summary.buckets
    );

    let weighting = usage
        .as_ref()
        .map(|usage| (usage, config.ruleset.reliability_weight));
    let entries = collect_ruleset(&mut buckets, weighting);
    summary.reported_rules = entries.len();

    write_new(&config.output, &render(entries, config)?)?;
    tracing::info!(
        "Wrote {} rules to {}",
        summary.reported_rules,
        config.output.display()
    );

    if let Some(dir) = &config.graphs_dir {
        let export = export_buckets(&buckets, dir);
        summary.graph_files = export.written.len();
        summary.failed_exports = export.failed;
    }

    tracing::info!(?summary, "Run complete");
    Ok(summary)
}

fn render(entries: Vec<RulesetEntry>, config: &PipelineConfig) -> Result<String> {
    let detailed = config.ruleset.detailed;
    match config.output_format {
        OutputFormat::Csv => {
            let mut output = RulesetCsvOutput::new(detailed);
            for entry in entries {
                output.add_entry(entry);
            }
            Ok(output.to_csv())
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new(detailed);
            for entry in entries {
                output.add_entry(entry);
            }
            output.to_json().context("Failed to serialize ruleset")
        }
    }
}

fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(RulesetError::OutputExists(path.to_path_buf()).into());
    }
    Ok(())
}

fn write_new(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => RulesetError::OutputExists(path.to_path_buf()),
            _ => RulesetError::Io(e),
        })
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}
