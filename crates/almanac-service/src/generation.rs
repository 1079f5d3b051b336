//! Materializes occurrences from specifications without duplicating rows.

use std::collections::HashSet;

use almanac_db::model::{EventOccurrence, EventSpecification};
use almanac_db::store::EventStore;
use almanac_rrule::rule::{Expansion, Window, compile, expand};
use chrono::{DateTime, Utc};

use crate::context::{GenerateOptions, TimeContext};
use crate::error::{ServiceError, ServiceResult};

/// Occurrences in the requested range and how many of them are new.
#[derive(Debug, Clone, Default)]
pub struct Generated {
    /// Pre-existing and newly created occurrences, ascending by start.
    pub occurrences: Vec<EventOccurrence>,
    pub created: usize,
}

/// Outcome of a generation pass over every specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub specifications: usize,
    pub created: usize,
    /// Specifications passed over because they fail validation.
    pub skipped: usize,
}

/// ## Summary
/// Materializes a specification's occurrences within the requested window.
///
/// Instants already stored for the specification are returned but not
/// re-created. New occurrences mirror the specification and then receive the
/// requested attribute overrides.
///
/// ## Errors
/// Returns `ServiceError::InvalidSpecification` before touching the store if
/// the specification fails validation. Store and expansion failures are
/// propagated.
#[tracing::instrument(skip(store, spec, options, ctx), fields(
    specification_id = %spec.id,
    repeat = %spec.repeat,
    from = ?options.from,
    to = ?options.to,
    count = ?options.count,
))]
pub async fn generate_events<S>(
    store: &S,
    spec: &EventSpecification,
    options: &GenerateOptions,
    ctx: &TimeContext,
) -> ServiceResult<Generated>
where
    S: EventStore + ?Sized,
{
    let recurrence = spec.validate().map_err(|errors| {
        tracing::warn!(%errors, "Refusing to generate for invalid specification");
        ServiceError::InvalidSpecification(errors)
    })?;

    let rule = compile(&recurrence, spec.until);
    let expansion = Expansion {
        rule: rule.as_ref(),
        start_at: spec.start_at,
        until: spec.until,
        zone: ctx.zone,
        max_instances: ctx.max_instances,
    };
    let window = Window {
        from: options.from,
        to: options.to,
        count: options.count,
    };

    let instants = expand(&expansion, &window)?;
    if instants.is_empty() {
        tracing::debug!("No instants in window");
        return Ok(Generated::default());
    }

    let existing = store.occurrences_at(spec.id, &instants).await?;
    let materialized: HashSet<DateTime<Utc>> = existing.iter().map(|o| o.start_at).collect();

    let fresh: Vec<EventOccurrence> = instants
        .iter()
        .filter(|instant| !materialized.contains(*instant))
        .map(|&instant| {
            let mut occurrence = EventOccurrence::from_specification(spec, instant);
            occurrence.apply_overrides(&options.attributes);
            occurrence
        })
        .collect();

    if fresh.is_empty() {
        tracing::debug!(existing = existing.len(), "Every instant already materialized");
        return Ok(Generated {
            occurrences: existing,
            created: 0,
        });
    }

    let created = store.insert_occurrences(&fresh).await?;
    let occurrences = store.occurrences_at(spec.id, &instants).await?;

    tracing::debug!(
        instants = instants.len(),
        existing = existing.len(),
        created,
        "Generated occurrences"
    );

    Ok(Generated {
        occurrences,
        created,
    })
}

/// ## Summary
/// Runs [`generate_events`] for every stored specification with the same
/// window, adding up the created counts.
///
/// Invalid specifications are logged and skipped.
///
/// ## Errors
/// Returns an error if the store or an expansion fails.
#[tracing::instrument(skip(store, options, ctx), fields(from = ?options.from, to = ?options.to))]
pub async fn generate_all<S>(
    store: &S,
    options: &GenerateOptions,
    ctx: &TimeContext,
) -> ServiceResult<BatchReport>
where
    S: EventStore + ?Sized,
{
    let specifications = store.specifications().await?;
    let mut report = BatchReport::default();

    for spec in &specifications {
        report.specifications += 1;
        match generate_events(store, spec, options, ctx).await {
            Ok(generated) => report.created += generated.created,
            Err(ServiceError::InvalidSpecification(errors)) => {
                tracing::warn!(
                    specification_id = %spec.id,
                    %errors,
                    "Skipping invalid specification"
                );
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        specifications = report.specifications,
        created = report.created,
        skipped = report.skipped,
        "Batch generation finished"
    );

    Ok(report)
}
