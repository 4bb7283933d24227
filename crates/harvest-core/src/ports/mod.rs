//! Ports - collaborator interfaces.
//!
//! The execution engine and the application layer only see these traits.
//! Concrete implementations (the `aws` CLI, files, in-memory fakes) live in
//! `impls`, and the console/progress bar lives in the binary.

pub mod event_sink;
pub mod lookup;
pub mod output;
pub mod progress;
pub mod source;

pub use self::event_sink::EventSink;
pub use self::lookup::VersionLookup;
pub use self::output::OutputSink;
pub use self::progress::ProgressSink;
pub use self::source::RecordSource;
