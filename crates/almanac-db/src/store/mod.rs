//! Storage seam between the generation service and persistence.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::DbResult;
use crate::model::{EventOccurrence, EventSpecification};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Persistence operations the generation service relies on.
pub trait EventStore: Send + Sync {
    /// Inserts or replaces a specification.
    fn save_specification<'a>(
        &'a self,
        spec: &'a EventSpecification,
    ) -> BoxFuture<'a, DbResult<()>>;

    fn specification<'a>(
        &'a self,
        id: Uuid,
    ) -> BoxFuture<'a, DbResult<Option<EventSpecification>>>;

    /// Every known specification, oldest first.
    fn specifications<'a>(&'a self) -> BoxFuture<'a, DbResult<Vec<EventSpecification>>>;

    /// Already-materialized occurrences of a specification at any of `instants`,
    /// in ascending order.
    fn occurrences_at<'a>(
        &'a self,
        specification_id: Uuid,
        instants: &'a [DateTime<Utc>],
    ) -> BoxFuture<'a, DbResult<Vec<EventOccurrence>>>;

    /// Persists occurrences in one atomic step, silently skipping any whose
    /// `(specification_id, start_at)` already exists. Returns how many were
    /// written.
    fn insert_occurrences<'a>(
        &'a self,
        occurrences: &'a [EventOccurrence],
    ) -> BoxFuture<'a, DbResult<usize>>;

    /// Removes a specification's occurrences starting at or after `from`.
    fn delete_occurrences_from<'a>(
        &'a self,
        specification_id: Uuid,
        from: DateTime<Utc>,
    ) -> BoxFuture<'a, DbResult<usize>>;

    /// Every occurrence of a specification, ascending by start.
    fn occurrences_for<'a>(
        &'a self,
        specification_id: Uuid,
    ) -> BoxFuture<'a, DbResult<Vec<EventOccurrence>>>;
}
