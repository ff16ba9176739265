// ABOUTME: Progress tracking for tenant provisioning runs.
// ABOUTME: Immutable per-tenant records behind a shared, swept map.

mod record;
mod tracker;

pub use record::{ProgressRecord, Stage, Status};
pub use tracker::ProgressTracker;
