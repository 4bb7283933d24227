//! Domain model (records, outcomes, aggregate output, events, errors).

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod record;

pub use aggregate::{AggregateOutput, Summary};
pub use errors::{ErrorKind, HarvestError, LookupError};
pub use events::{Delivery, HarvestEvent};
pub use ids::RunId;
pub use outcome::{FailureReason, Outcome};
pub use record::{PolicyRecord, ResolvedVersion};
