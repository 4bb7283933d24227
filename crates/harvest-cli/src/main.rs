//! policy-harvest
//!
//! Lists every AWS managed IAM policy, fetches the document of its default
//! version and prints (or saves) one JSON object keyed by policy name.
//!
//! ```bash
//! policy-harvest --concurrency 20 --save policies.json
//! policy-harvest --silent > policies.json
//! ```
//!
//! Requires the `aws` CLI with credentials allowed to call
//! `iam:ListPolicies` and `iam:GetPolicyVersion`.

mod args;
mod console;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use harvest_core::ResolutionPipeline;
use harvest_core::impls::{AwsCli, AwsCliLookup, AwsCliSource, FileOutput, StdoutOutput};
use harvest_core::ports::OutputSink;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::console::Console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output: Arc<dyn OutputSink> = match &cli.save {
        Some(path) => {
            let path = std::path::absolute(path)
                .with_context(|| format!("invalid output path {}", path.display()))?;
            Arc::new(FileOutput::new(path))
        }
        None => Arc::new(StdoutOutput),
    };

    let aws = AwsCli::new(&cli.aws_bin);
    let console = Arc::new(Console::new(cli.silent));

    let pipeline = ResolutionPipeline::builder()
        .source(Arc::new(AwsCliSource::new(aws.clone())))
        .lookup(Arc::new(AwsCliLookup::new(aws)))
        .output(output)
        .progress(console.clone())
        .events(console)
        .settings(cli.settings())
        .build()?;

    let report = pipeline
        .run()
        .await
        .context("failed to harvest AWS managed policies")?;

    tracing::debug!(
        run_id = %report.run_id,
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "run complete"
    );
    Ok(())
}
