//! CLI argument definitions using clap

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use harvest_core::{ConcurrencyLimit, PipelineSettings, RetryPolicy};

#[derive(Debug, Parser)]
#[command(name = "policy-harvest")]
#[command(about = "Collect every AWS managed IAM policy together with its default version document")]
#[command(version)]
pub struct Cli {
    /// Maximum number of policy versions fetched at once (values below 1 mean 1)
    #[arg(
        long,
        env = "HARVEST_CONCURRENCY",
        default_value_t = 10,
        allow_negative_numbers = true
    )]
    pub concurrency: i64,

    /// Write the result to this file instead of stdout
    #[arg(long, value_name = "PATH", env = "HARVEST_OUTPUT")]
    pub save: Option<PathBuf>,

    /// Suppress status lines and the progress bar
    #[arg(long)]
    pub silent: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short)]
    pub verbose: bool,

    /// Retries after the first failed lookup of a policy
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// Fixed part of the delay before each retry, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub retry_base_ms: u64,

    /// Upper bound of the random part of the delay, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub retry_jitter_ms: u64,

    /// Path to the aws executable
    #[arg(long, value_name = "PATH", env = "HARVEST_AWS_BIN", default_value = "aws")]
    pub aws_bin: PathBuf,
}

impl Cli {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings::default()
            .with_concurrency(ConcurrencyLimit::new(self.concurrency))
            .with_retry(RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_base_ms),
                Duration::from_millis(self.retry_jitter_ms),
            ))
    }
}
