//! Query composition for `event_specification`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_specification;
use crate::model::specification::EventSpecification;

/// ## Summary
/// Inserts a specification, or replaces every column of an existing one.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn upsert(conn: &mut DbConnection<'_>, spec: &EventSpecification) -> QueryResult<()> {
    diesel::insert_into(event_specification::table)
        .values(spec)
        .on_conflict(event_specification::id)
        .do_update()
        .set(spec)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Fetches a specification by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(
    conn: &mut DbConnection<'_>,
    id: Uuid,
) -> QueryResult<Option<EventSpecification>> {
    event_specification::table
        .find(id)
        .select(EventSpecification::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists every specification, oldest first.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn all(conn: &mut DbConnection<'_>) -> QueryResult<Vec<EventSpecification>> {
    event_specification::table
        .order((event_specification::created_at.asc(), event_specification::id.asc()))
        .select(EventSpecification::as_select())
        .load(conn)
        .await
}
