use anyhow::{Context, Result};
use clap::Parser;
use guardminer::{
    cli::Cli,
    config::RulesetConfig,
    pipeline::{self, PipelineConfig},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE level
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut ruleset = match &args.config {
        Some(path) => RulesetConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => RulesetConfig::default(),
    };
    if args.detailed {
        ruleset.detailed = true;
    }
    if args.allow_equal_support {
        ruleset.strict_support = false;
    }

    let config = PipelineConfig {
        input: args.input,
        output: args.output,
        output_format: args.format,
        graphs_dir: args.graphs,
        api_usage: args.api_usage,
        denylist_file: args.denylist,
        matched_out: args.matched_out,
        ruleset,
    };

    let summary = pipeline::run(&config)?;

    if summary.failed_exports > 0 {
        tracing::warn!("{} graph files could not be written", summary.failed_exports);
    }

    Ok(())
}
