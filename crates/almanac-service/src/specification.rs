//! Specification lifecycle: create and update with eager generation.

use almanac_db::model::{EventOccurrence, EventSpecification};
use almanac_db::store::EventStore;
use almanac_rrule::rule::{Recurrence, ValidationErrors, by_hour_start, compile};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::context::{GenerateDirective, GenerateOptions, TimeContext};
use crate::error::{ServiceError, ServiceResult};
use crate::generation::{Generated, generate_events};

/// Result of saving a specification.
#[derive(Debug, Clone)]
pub enum Saved {
    Stored {
        specification: Box<EventSpecification>,
        /// `None` when generation was suppressed.
        generated: Option<Generated>,
    },
    /// Nothing was stored; the caller should correct the listed fields.
    Rejected(ValidationErrors),
}

/// ## Summary
/// Validates, normalizes and stores a new specification, then eagerly
/// generates occurrences according to `directive`.
///
/// `by_hour` specifications have their start moved to the next target hour
/// here, once; later generation runs never move it again.
///
/// ## Errors
/// Returns an error if the store or expansion fails. Field-level problems are
/// reported as [`Saved::Rejected`].
#[tracing::instrument(
    skip(store, spec, ctx),
    fields(specification_id = %spec.id, repeat = %spec.repeat)
)]
pub async fn create_specification<S>(
    store: &S,
    mut spec: EventSpecification,
    directive: GenerateDirective,
    ctx: &TimeContext,
) -> ServiceResult<Saved>
where
    S: EventStore + ?Sized,
{
    let recurrence = match spec.validate() {
        Ok(recurrence) => recurrence,
        Err(errors) => {
            tracing::debug!(%errors, "Specification rejected");
            return Ok(Saved::Rejected(errors));
        }
    };

    if let Some(hours) = recurrence.hours() {
        let duration = spec.duration();
        let start_at = by_hour_start(spec.start_at, &hours, ctx.now, ctx.zone);
        if start_at != spec.start_at {
            tracing::debug!(
                declared = %spec.start_at,
                %start_at,
                "Moved start to next target hour"
            );
            spec.start_at = start_at;
            spec.end_at = start_at + duration;
        }
    }

    let recurrence = match spec.validate() {
        Ok(recurrence) => recurrence,
        Err(errors) => return Ok(Saved::Rejected(errors)),
    };

    refresh(&mut spec, &recurrence, ctx);
    store.save_specification(&spec).await?;
    tracing::info!(rrule = ?spec.rrule, "Specification created");

    let generated = autogenerate(store, &spec, directive, spec.start_at, ctx).await?;

    Ok(Saved::Stored {
        specification: Box::new(spec),
        generated,
    })
}

/// ## Summary
/// Revalidates and stores a changed specification, replacing its future
/// occurrences.
///
/// Occurrences starting at or after `ctx.now` are deleted and regenerated
/// from the later of the start and `ctx.now`; earlier ones are kept.
///
/// ## Errors
/// Returns `ServiceError::NotFound` if the specification was never stored,
/// or an error if the store or expansion fails.
#[tracing::instrument(
    skip(store, spec, ctx),
    fields(specification_id = %spec.id, repeat = %spec.repeat)
)]
pub async fn update_specification<S>(
    store: &S,
    mut spec: EventSpecification,
    directive: GenerateDirective,
    ctx: &TimeContext,
) -> ServiceResult<Saved>
where
    S: EventStore + ?Sized,
{
    if store.specification(spec.id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("specification {}", spec.id)));
    }

    let recurrence = match spec.validate() {
        Ok(recurrence) => recurrence,
        Err(errors) => {
            tracing::debug!(%errors, "Update rejected");
            return Ok(Saved::Rejected(errors));
        }
    };

    refresh(&mut spec, &recurrence, ctx);
    let deleted = store.delete_occurrences_from(spec.id, ctx.now).await?;
    store.save_specification(&spec).await?;
    tracing::info!(deleted, rrule = ?spec.rrule, "Specification updated");

    let from = spec.start_at.max(ctx.now);
    let generated = autogenerate(store, &spec, directive, from, ctx).await?;

    Ok(Saved::Stored {
        specification: Box::new(spec),
        generated,
    })
}

/// ## Summary
/// Lists every materialized occurrence of a specification, ascending.
///
/// ## Errors
/// Returns `ServiceError::NotFound` for an unknown specification, or an error
/// if the store fails.
#[tracing::instrument(skip(store))]
pub async fn occurrences<S>(
    store: &S,
    specification_id: Uuid,
) -> ServiceResult<Vec<EventOccurrence>>
where
    S: EventStore + ?Sized,
{
    if store.specification(specification_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "specification {specification_id}"
        )));
    }
    Ok(store.occurrences_for(specification_id).await?)
}

fn refresh(spec: &mut EventSpecification, recurrence: &Recurrence, ctx: &TimeContext) {
    spec.rrule = compile(recurrence, spec.until).map(|rule| rule.to_string());
    spec.updated_at = ctx.now;
}

async fn autogenerate<S>(
    store: &S,
    spec: &EventSpecification,
    directive: GenerateDirective,
    from: DateTime<Utc>,
    ctx: &TimeContext,
) -> ServiceResult<Option<Generated>>
where
    S: EventStore + ?Sized,
{
    let options = match directive {
        GenerateDirective::Suppress => {
            tracing::debug!("Generation suppressed");
            return Ok(None);
        }
        // The default window is half-open: an instant exactly `days` after
        // `from` belongs to the next window.
        GenerateDirective::Default => GenerateOptions {
            from: Some(from),
            to: Some(
                from + TimeDelta::days(i64::from(ctx.default_window_days))
                    - TimeDelta::seconds(1),
            ),
            ..GenerateOptions::default()
        },
        GenerateDirective::Window { to, count } => GenerateOptions {
            from: Some(from),
            to,
            count,
            ..GenerateOptions::default()
        },
    };

    generate_events(store, spec, &options, ctx).await.map(Some)
}
