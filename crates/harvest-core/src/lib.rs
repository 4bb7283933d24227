//! harvest-core
//!
//! Core building blocks for harvesting AWS managed IAM policies: a bounded
//! concurrency scheduler, a retry runner, and the pipeline that lists
//! policies, fetches each default version and aggregates the result.
//!
//! # Modules
//! - **domain**: records, outcomes, aggregate output, events, errors, ids
//! - **ports**: collaborator traits (RecordSource, VersionLookup, OutputSink, ...)
//! - **engine**: RetryRunner and ConcurrencyScheduler, independent of IAM
//! - **app**: PipelineBuilder, ResolutionPipeline, RecordResolver
//! - **impls**: `aws` CLI adapters, file/stdout output, in-memory fakes

pub mod app;
pub mod domain;
pub mod engine;
pub mod impls;
pub mod ports;

pub use app::{PipelineBuilder, PipelineReport, PipelineSettings, Resolution, ResolutionPipeline};
pub use domain::{AggregateOutput, HarvestError, Outcome, PolicyRecord, Summary};
pub use engine::{ConcurrencyLimit, ConcurrencyScheduler, RetryPolicy, RetryRunner};
