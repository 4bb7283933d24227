//! Impls - concrete collaborators.
//!
//! - **aws_cli**: record source and version lookup via the `aws` command line
//! - **output**: file and stdout output sinks
//! - **memory**: in-memory source, scripted lookup and recording sinks (dev/test)
//! - **noop**: sinks that discard everything

pub mod aws_cli;
pub mod memory;
pub mod noop;
pub mod output;

pub use self::aws_cli::{AwsCli, AwsCliLookup, AwsCliSource};
pub use self::memory::{
    CountingProgress, InMemorySource, MemoryOutput, RecordingEventSink, Script, ScriptedLookup,
};
pub use self::noop::{NoopEventSink, NoopProgress};
pub use self::output::{FileOutput, StdoutOutput};
