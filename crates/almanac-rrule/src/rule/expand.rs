//! Occurrence expansion using the `rrule` crate.

use chrono::{DateTime, NaiveDateTime, NaiveTime, SubsecRound, TimeDelta, TimeZone, Timelike, Utc};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};

use super::compile::CompiledRule;
use crate::error::{RuleError, RuleResult};

/// Bounds on an expansion request. Every bound is inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Keep only the earliest `count` instants.
    pub count: Option<u32>,
}

/// What to expand: a specification's rule and its fixed bounds.
#[derive(Debug, Clone, Copy)]
pub struct Expansion<'a> {
    /// `None` for non-recurring specifications.
    pub rule: Option<&'a CompiledRule>,
    pub start_at: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
    /// Zone whose wall clock the rule is evaluated in.
    pub zone: chrono_tz::Tz,
    /// Cap applied when neither `to`, `until` nor `count` bounds the request.
    pub max_instances: u16,
}

/// ## Summary
/// Expands a specification into its ascending occurrence instants.
///
/// The start instant is always the first occurrence, whether or not it
/// matches the rule's `BY*` filters.
///
/// ## Errors
/// Returns `RuleError::ExpansionError` if the rule is rejected by the
/// recurrence engine.
pub fn expand(expansion: &Expansion<'_>, window: &Window) -> RuleResult<Vec<DateTime<Utc>>> {
    let start = expansion.start_at.trunc_subsecs(0);
    let lower = window.from.map_or(start, |from| from.max(start));
    let upper = [window.to, expansion.until].into_iter().flatten().min();

    if window.count == Some(0) || upper.is_some_and(|upper| upper < lower) {
        tracing::trace!(%lower, ?upper, "Empty expansion window");
        return Ok(Vec::new());
    }

    let limit = match (window.count, upper) {
        (Some(count), _) => Some(usize::try_from(count).unwrap_or(usize::MAX)),
        (None, Some(_)) => None,
        (None, None) => {
            tracing::warn!(
                max_instances = expansion.max_instances,
                "Unbounded expansion, capping instance count"
            );
            Some(usize::from(expansion.max_instances))
        }
    };

    let Some(rule) = expansion.rule else {
        let in_window = start >= lower && upper.is_none_or(|upper| start <= upper);
        return Ok(if in_window { vec![start] } else { Vec::new() });
    };

    let rrule_set = build_rrule_set(rule, start, expansion.zone)?;

    let mut instants: Vec<DateTime<Utc>> = Vec::new();
    for instant in &rrule_set {
        let instant = instant.with_timezone(&Utc);
        if upper.is_some_and(|upper| instant > upper) {
            break;
        }
        if instant < lower || instants.last() == Some(&instant) {
            continue;
        }
        tracing::trace!(%instant, "Expanded instant");
        instants.push(instant);
        if limit.is_some_and(|limit| instants.len() >= limit) {
            break;
        }
    }

    tracing::debug!(
        rule = %rule,
        zone = %expansion.zone,
        count = instants.len(),
        "Expanded recurrence"
    );

    Ok(instants)
}

/// Builds the rule set with the start as an extra date so it always leads.
fn build_rrule_set(
    rule: &CompiledRule,
    start: DateTime<Utc>,
    zone: chrono_tz::Tz,
) -> RuleResult<RRuleSet> {
    let rrule = rule
        .without_until()
        .to_string()
        .parse::<RRule<Unvalidated>>()
        .map_err(|e| RuleError::ExpansionError(e.to_string()))?;

    let dt_start = start.with_timezone(&Tz::Tz(zone));
    let rrule_set = rrule
        .build(dt_start)
        .map_err(|e| RuleError::ExpansionError(e.to_string()))?;

    Ok(rrule_set.set_rdates(vec![dt_start]))
}

/// ## Summary
/// Picks the first instant of a `by_hour` specification.
///
/// A declared start that is at or after `now` and falls exactly on one of the
/// target hours (in `zone`) is kept. Otherwise the earliest target hour on the
/// current or next local day that is at or after `now` is used.
#[must_use]
pub fn by_hour_start(
    declared: DateTime<Utc>,
    hours: &[u8],
    now: DateTime<Utc>,
    zone: chrono_tz::Tz,
) -> DateTime<Utc> {
    let local = declared.with_timezone(&zone);
    let on_target = local.minute() == 0
        && local.second() == 0
        && local.nanosecond() == 0
        && hours.iter().any(|&h| u32::from(h) == local.hour());
    if declared >= now && on_target {
        return declared;
    }

    let mut sorted = hours.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let today = now.with_timezone(&zone).date_naive();
    for day in [today, today + TimeDelta::days(1)] {
        for &hour in &sorted {
            let Some(time) = NaiveTime::from_hms_opt(u32::from(hour), 0, 0) else {
                continue;
            };
            let Some(candidate) = local_instant(zone, day.and_time(time)) else {
                continue;
            };
            let candidate = candidate.with_timezone(&Utc);
            if candidate >= now {
                tracing::debug!(%declared, %candidate, "Defaulted by_hour start");
                return candidate;
            }
        }
    }

    tracing::warn!(%declared, "No target hour found, keeping declared start");
    declared
}

/// Resolves a wall-clock time the way expansion does: the earlier instant of
/// a repeated hour, and one hour later for a time skipped by a DST gap.
fn local_instant(zone: chrono_tz::Tz, naive: NaiveDateTime) -> Option<DateTime<chrono_tz::Tz>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
}
