//! Generation-time inputs that are not part of a specification.

use almanac_core::config::GenerationConfig;
use almanac_core::constants::{DEFAULT_MAX_INSTANCES, DEFAULT_WINDOW_DAYS};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ServiceResult;

/// The clock and zone a generation run observes.
///
/// Wall-clock rule parts are evaluated in `zone` at generation time, not in
/// whatever zone was active when the specification was created.
#[derive(Debug, Clone, Copy)]
pub struct TimeContext {
    pub now: DateTime<Utc>,
    pub zone: chrono_tz::Tz,
    pub max_instances: u16,
    pub default_window_days: u32,
}

impl TimeContext {
    #[must_use]
    pub const fn new(now: DateTime<Utc>, zone: chrono_tz::Tz) -> Self {
        Self {
            now,
            zone,
            max_instances: DEFAULT_MAX_INSTANCES,
            default_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// ## Summary
    /// Builds a context from configuration, observed at `now`.
    ///
    /// ## Errors
    /// Returns `ServiceError::CoreError` if the configured zone is unknown.
    pub fn from_config(config: &GenerationConfig, now: DateTime<Utc>) -> ServiceResult<Self> {
        Ok(Self {
            now,
            zone: config.zone()?,
            max_instances: config.max_instances,
            default_window_days: config.default_window_days,
        })
    }
}

/// A generation request. Absent bounds match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub count: Option<u32>,
    /// Applied to every newly created occurrence, over mirrored attributes.
    pub attributes: Map<String, Value>,
}

/// What to generate right after a specification is saved.
///
/// Deserializes from `true`/`false` or from `{ "to": ..., "count": ... }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDirective")]
pub enum GenerateDirective {
    /// The configured default window, starting at the effective start.
    #[default]
    Default,
    Window {
        to: Option<DateTime<Utc>>,
        count: Option<u32>,
    },
    Suppress,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDirective {
    Flag(bool),
    Window {
        #[serde(default)]
        to: Option<DateTime<Utc>>,
        #[serde(default)]
        count: Option<u32>,
    },
}

impl From<RawDirective> for GenerateDirective {
    fn from(raw: RawDirective) -> Self {
        match raw {
            RawDirective::Flag(true) => Self::Default,
            RawDirective::Flag(false) => Self::Suppress,
            RawDirective::Window { to, count } => Self::Window { to, count },
        }
    }
}
