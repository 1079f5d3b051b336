//! Scheduled batch generation against PostgreSQL.

use almanac_core::config::Settings;
use almanac_db::db::connection::create_pool;
use almanac_db::store::PgStore;
use almanac_service::{BatchReport, GenerateOptions, TimeContext, generate_all};
use chrono::{DateTime, TimeDelta, Utc};

/// ## Summary
/// Builds the window one batch run covers: `[now, now + days]`.
#[must_use]
pub fn batch_options(now: DateTime<Utc>, days: u32) -> GenerateOptions {
    GenerateOptions {
        from: Some(now),
        to: Some(now + TimeDelta::days(i64::from(days))),
        ..GenerateOptions::default()
    }
}

/// ## Summary
/// Connects to the configured database and generates occurrences for every
/// specification over the configured window.
///
/// ## Errors
/// Returns an error if the database is not configured or unreachable, the
/// configured zone is unknown, or generation fails.
#[tracing::instrument(skip(settings))]
pub async fn run_batch(settings: &Settings, now: DateTime<Utc>) -> anyhow::Result<BatchReport> {
    let Some(database) = &settings.database else {
        anyhow::bail!("database.url is not configured");
    };

    let pool = create_pool(&database.url, u32::from(database.max_connections)).await?;
    let store = PgStore::new(pool);

    let ctx = TimeContext::from_config(&settings.generation, now)?;
    let options = batch_options(now, ctx.default_window_days);

    tracing::info!(
        zone = %ctx.zone,
        from = ?options.from,
        to = ?options.to,
        "Starting batch generation"
    );

    Ok(generate_all(&store, &options, &ctx).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn batch_window_spans_the_configured_days() {
        let now = Utc.with_ymd_and_hms(2011, 1, 15, 12, 0, 0).unwrap();
        let options = batch_options(now, 30);

        assert_eq!(options.from, Some(now));
        assert_eq!(options.to, Some(Utc.with_ymd_and_hms(2011, 2, 14, 12, 0, 0).unwrap()));
        assert!(options.count.is_none());
        assert!(options.attributes.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn missing_database_is_reported() {
        let settings: Settings = Settings::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let err = run_batch(&settings, Utc::now()).await.unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }
}
