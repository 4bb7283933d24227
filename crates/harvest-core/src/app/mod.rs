//! App - wiring of ports and engine into a run.
//!
//! # Components
//! - **PipelineBuilder**: assembly and validation of collaborators
//! - **ResolutionPipeline**: list → resolve in parallel → aggregate → deliver
//! - **RecordResolver**: retrying lookup + parse of a single record
//! - **PipelineSettings**: concurrency and retry tunables

pub mod builder;
pub mod config;
pub mod pipeline;
pub mod resolver;

pub use self::builder::{BuildError, PipelineBuilder};
pub use self::config::PipelineSettings;
pub use self::pipeline::{PipelineReport, Resolution, ResolutionPipeline};
pub use self::resolver::RecordResolver;
