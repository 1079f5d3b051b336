//! PostgreSQL-backed [`EventStore`].

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::EventStore;
use crate::db::DbProvider;
use crate::db::connection::DbPool;
use crate::db::query::{occurrence, specification};
use crate::error::DbResult;
use crate::model::{EventOccurrence, EventSpecification};

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EventStore for PgStore {
    #[tracing::instrument(skip(self, spec), fields(specification_id = %spec.id))]
    fn save_specification<'a>(
        &'a self,
        spec: &'a EventSpecification,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            specification::upsert(&mut conn, spec).await?;
            Ok(())
        })
    }

    #[tracing::instrument(skip(self))]
    fn specification<'a>(
        &'a self,
        id: Uuid,
    ) -> BoxFuture<'a, DbResult<Option<EventSpecification>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(specification::find(&mut conn, id).await?)
        })
    }

    #[tracing::instrument(skip(self))]
    fn specifications<'a>(&'a self) -> BoxFuture<'a, DbResult<Vec<EventSpecification>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(specification::all(&mut conn).await?)
        })
    }

    #[tracing::instrument(skip(self, instants), fields(instant_count = instants.len()))]
    fn occurrences_at<'a>(
        &'a self,
        specification_id: Uuid,
        instants: &'a [DateTime<Utc>],
    ) -> BoxFuture<'a, DbResult<Vec<EventOccurrence>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(occurrence::at_instants(&mut conn, specification_id, instants).await?)
        })
    }

    #[tracing::instrument(skip(self, occurrences), fields(row_count = occurrences.len()))]
    fn insert_occurrences<'a>(
        &'a self,
        occurrences: &'a [EventOccurrence],
    ) -> BoxFuture<'a, DbResult<usize>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            let inserted = occurrence::insert_batch(&mut conn, occurrences).await?;
            tracing::debug!(inserted, "Inserted occurrences");
            Ok(inserted)
        })
    }

    #[tracing::instrument(skip(self))]
    fn delete_occurrences_from<'a>(
        &'a self,
        specification_id: Uuid,
        from: DateTime<Utc>,
    ) -> BoxFuture<'a, DbResult<usize>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(occurrence::delete_from(&mut conn, specification_id, from).await?)
        })
    }

    #[tracing::instrument(skip(self))]
    fn occurrences_for<'a>(
        &'a self,
        specification_id: Uuid,
    ) -> BoxFuture<'a, DbResult<Vec<EventOccurrence>>> {
        Box::pin(async move {
            let mut conn = self.pool.get_connection().await?;
            Ok(occurrence::by_specification(&mut conn, specification_id).await?)
        })
    }
}
