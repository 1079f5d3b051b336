//! Query composition for `event_occurrence`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_occurrence;
use crate::model::occurrence::EventOccurrence;

/// ## Summary
/// Loads the occurrences of a specification that start at any of `instants`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn at_instants(
    conn: &mut DbConnection<'_>,
    specification_id: Uuid,
    instants: &[DateTime<Utc>],
) -> QueryResult<Vec<EventOccurrence>> {
    if instants.is_empty() {
        return Ok(Vec::new());
    }

    event_occurrence::table
        .filter(event_occurrence::specification_id.eq(specification_id))
        .filter(event_occurrence::start_at.eq_any(instants.to_vec()))
        .order(event_occurrence::start_at.asc())
        .select(EventOccurrence::as_select())
        .load(conn)
        .await
}

/// Rows bound into one `INSERT`. Each row binds six parameters and
/// PostgreSQL rejects statements with more than 65535.
pub const INSERT_CHUNK_ROWS: usize = 1000;

/// ## Summary
/// Inserts occurrences, skipping any whose `(specification_id, start_at)`
/// already exists. Returns the number of rows actually inserted.
///
/// Rows are written in chunks of [`INSERT_CHUNK_ROWS`] inside one
/// transaction, so either every chunk lands or none does.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_batch<'a>(
    conn: &mut DbConnection<'a>,
    occurrences: &'a [EventOccurrence],
) -> QueryResult<usize> {
    if occurrences.is_empty() {
        return Ok(0);
    }

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            let mut inserted = 0;
            for chunk in occurrences.chunks(INSERT_CHUNK_ROWS) {
                inserted += diesel::insert_into(event_occurrence::table)
                    .values(chunk)
                    .on_conflict((event_occurrence::specification_id, event_occurrence::start_at))
                    .do_nothing()
                    .execute(conn)
                    .await?;
            }
            Ok(inserted)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Deletes the occurrences of a specification starting at or after `from`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_from(
    conn: &mut DbConnection<'_>,
    specification_id: Uuid,
    from: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::delete(
        event_occurrence::table
            .filter(event_occurrence::specification_id.eq(specification_id))
            .filter(event_occurrence::start_at.ge(from)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Lists every occurrence of a specification in ascending order.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_specification(
    conn: &mut DbConnection<'_>,
    specification_id: Uuid,
) -> QueryResult<Vec<EventOccurrence>> {
    event_occurrence::table
        .filter(event_occurrence::specification_id.eq(specification_id))
        .order(event_occurrence::start_at.asc())
        .select(EventOccurrence::as_select())
        .load(conn)
        .await
}
