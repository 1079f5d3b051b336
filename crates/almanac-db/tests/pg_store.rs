//! Runs against PostgreSQL when `TEST_DATABASE_URL` is set; each test works
//! in its own scratch schema and drops it afterwards.

use almanac_db::db::DbProvider;
use almanac_db::db::connection::{DbPool, create_pool};
use almanac_db::db::query::occurrence::INSERT_CHUNK_ROWS;
use almanac_db::model::{EventOccurrence, EventSpecification, SpecificationDraft};
use almanac_db::store::{EventStore, PgStore};
use chrono::{TimeDelta, TimeZone, Utc};
use diesel_async::SimpleAsyncConnection;

const CREATE_TABLES: &str = include_str!("../migrations/2026-01-01-000000_create_events/up.sql");

async fn scratch_pool() -> Option<(DbPool, String)> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        tracing::warn!("TEST_DATABASE_URL is not set, skipping PostgreSQL test");
        return None;
    };

    // A single connection, so the search_path set here applies to every query.
    let pool = create_pool(&url, 1).await.unwrap();
    let schema = format!("almanac_test_{}", uuid::Uuid::now_v7().simple());
    let mut conn = pool.get_connection().await.unwrap();
    conn.batch_execute(&format!(
        "CREATE SCHEMA {schema}; SET search_path TO {schema}; {CREATE_TABLES}"
    ))
    .await
    .unwrap();
    drop(conn);

    Some((pool, schema))
}

async fn drop_schema(pool: &DbPool, schema: &str) {
    let mut conn = pool.get_connection().await.unwrap();
    conn.batch_execute(&format!("DROP SCHEMA {schema} CASCADE; RESET search_path"))
        .await
        .unwrap();
}

fn hourly(spec: &EventSpecification, hours: i64) -> Vec<EventOccurrence> {
    (0..hours)
        .map(|hour| {
            EventOccurrence::from_specification(spec, spec.start_at + TimeDelta::hours(hour))
        })
        .collect()
}

#[test_log::test(tokio::test)]
async fn two_years_of_hourly_occurrences_insert_in_chunks() {
    let Some((pool, schema)) = scratch_pool().await else {
        return;
    };
    let store = PgStore::new(pool.clone());

    let start = Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap();
    let spec = SpecificationDraft::new("hourly check")
        .start_at(start)
        .build(start);
    store.save_specification(&spec).await.unwrap();

    let rows = hourly(&spec, 24 * 730);
    assert!(rows.len() > 10 * INSERT_CHUNK_ROWS);

    assert_eq!(store.insert_occurrences(&rows).await.unwrap(), rows.len());
    assert_eq!(store.insert_occurrences(&rows).await.unwrap(), 0);

    let stored = store.occurrences_for(spec.id).await.unwrap();
    assert_eq!(stored.len(), rows.len());
    assert_eq!(stored[0].start_at, start);
    assert_eq!(
        stored[stored.len() - 1].start_at,
        start + TimeDelta::hours(24 * 730 - 1)
    );

    let instants = [start, start + TimeDelta::hours(5), start - TimeDelta::hours(1)];
    assert_eq!(store.occurrences_at(spec.id, &instants).await.unwrap().len(), 2);

    let cutoff = start + TimeDelta::hours(24 * 700);
    let deleted = store.delete_occurrences_from(spec.id, cutoff).await.unwrap();
    assert_eq!(deleted, 24 * 30);

    drop_schema(&pool, &schema).await;
}

#[test_log::test(tokio::test)]
async fn specifications_round_trip_through_postgres() {
    let Some((pool, schema)) = scratch_pool().await else {
        return;
    };
    let store = PgStore::new(pool.clone());

    let start = Utc.with_ymd_and_hms(2011, 1, 15, 12, 0, 0).unwrap();
    let mut spec = SpecificationDraft::new("walk the dog")
        .start_at(start)
        .repeat("weekly")
        .on(serde_json::json!(["monday", "friday"]))
        .attribute("added_string", "foo")
        .build(start);
    store.save_specification(&spec).await.unwrap();

    spec.description = Some("walk the cat".to_string());
    store.save_specification(&spec).await.unwrap();

    let loaded = store.specification(spec.id).await.unwrap().unwrap();
    assert_eq!(loaded.description.as_deref(), Some("walk the cat"));
    assert_eq!(loaded.on, spec.on);
    assert_eq!(store.specifications().await.unwrap().len(), 1);

    drop_schema(&pool, &schema).await;
}
