//! File and stdout output sinks.
//!
//! Both write the aggregate output as tab-indented JSON.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::domain::{AggregateOutput, Delivery, HarvestError, Summary};
use crate::ports::OutputSink;

/// Writes (overwriting) the output to a file.
#[derive(Debug, Clone)]
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OutputSink for FileOutput {
    async fn deliver(
        &self,
        summary: &Summary,
        output: &AggregateOutput,
    ) -> Result<Delivery, HarvestError> {
        let bytes = output.to_pretty_json().map_err(HarvestError::Serialize)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|source| HarvestError::Output {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path.display(), succeeded = summary.succeeded, "output written");
        Ok(Delivery::File(self.path.clone()))
    }
}

/// Prints the output on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutput;

#[async_trait]
impl OutputSink for StdoutOutput {
    async fn deliver(
        &self,
        _summary: &Summary,
        output: &AggregateOutput,
    ) -> Result<Delivery, HarvestError> {
        write_document(&mut tokio::io::stdout(), output).await?;
        Ok(Delivery::Stdout)
    }
}

/// Write the output followed by a newline, then flush.
async fn write_document<W>(writer: &mut W, output: &AggregateOutput) -> Result<(), HarvestError>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = output.to_pretty_json().map_err(HarvestError::Serialize)?;
    bytes.push(b'\n');

    writer.write_all(&bytes).await.map_err(HarvestError::Stdout)?;
    writer.flush().await.map_err(HarvestError::Stdout)?;
    Ok(())
}
