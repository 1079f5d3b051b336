use almanac_core::constants::DEFAULT_DURATION_HOURS;
use almanac_rrule::rule::{
    Recurrence, RecurrenceParams, RepeatKind, SpecificationInput, ValidationErrors,
    validate_specification,
};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use diesel::{pg::Pg, prelude::*};
use serde_json::{Map, Value};

use crate::db::schema;

/// Recurrence template that occurrences are generated from.
///
/// `frequency`, `on`, `on_the` and `target` are stored as submitted; their
/// meaning depends on `repeat` and is only checked by [`Self::validate`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = schema::event_specification)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct EventSpecification {
    pub id: uuid::Uuid,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub repeat: String,
    pub frequency: Option<Value>,
    #[diesel(column_name = on_values)]
    pub on: Option<Value>,
    pub on_the: Option<Value>,
    pub target: Option<Value>,
    pub until: Option<DateTime<Utc>>,
    /// Cached canonical rule, refreshed whenever the specification is saved
    /// through the service layer.
    pub rrule: Option<String>,
    /// Mirrored attributes copied onto every occurrence.
    pub attributes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventSpecification {
    #[must_use]
    pub fn repeat_kind(&self) -> Option<RepeatKind> {
        RepeatKind::parse(&self.repeat)
    }

    #[must_use]
    pub fn params(&self) -> RecurrenceParams<'_> {
        RecurrenceParams {
            repeat: &self.repeat,
            frequency: self.frequency.as_ref(),
            on: self.on.as_ref(),
            on_the: self.on_the.as_ref(),
            target: self.target.as_ref(),
        }
    }

    /// ## Summary
    /// Checks the specification against the legality matrix.
    ///
    /// ## Errors
    /// Returns the per-field errors if the specification is invalid.
    pub fn validate(&self) -> Result<Recurrence, ValidationErrors> {
        validate_specification(&SpecificationInput {
            description: self.description.as_deref(),
            start_at: self.start_at,
            until: self.until,
            params: self.params(),
        })
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_at - self.start_at
    }

    /// Mirrored attributes as a map; anything but a JSON object counts as empty.
    #[must_use]
    pub fn mirrored_attributes(&self) -> Map<String, Value> {
        match &self.attributes {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// A specification before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct SpecificationDraft {
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub repeat: Option<String>,
    pub frequency: Option<Value>,
    pub on: Option<Value>,
    pub on_the: Option<Value>,
    pub target: Option<Value>,
    pub until: Option<DateTime<Utc>>,
    pub attributes: Map<String, Value>,
}

impl SpecificationDraft {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn repeat(mut self, repeat: impl Into<String>) -> Self {
        self.repeat = Some(repeat.into());
        self
    }

    #[must_use]
    pub const fn start_at(mut self, start_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self
    }

    #[must_use]
    pub const fn end_at(mut self, end_at: DateTime<Utc>) -> Self {
        self.end_at = Some(end_at);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: impl Into<Value>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    #[must_use]
    pub fn on(mut self, on: impl Into<Value>) -> Self {
        self.on = Some(on.into());
        self
    }

    #[must_use]
    pub fn on_the(mut self, on_the: impl Into<Value>) -> Self {
        self.on_the = Some(on_the.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<Value>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub const fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// ## Summary
    /// Applies defaults and produces a specification with a fresh id.
    ///
    /// The start defaults to `now` (whole seconds), the end to one hour after
    /// the start, the kind to `none`, and the frequency to 1 for kinds that
    /// take one.
    #[must_use]
    pub fn build(self, now: DateTime<Utc>) -> EventSpecification {
        let start_at = self.start_at.unwrap_or(now).trunc_subsecs(0);
        let end_at = self
            .end_at
            .unwrap_or(start_at + TimeDelta::hours(DEFAULT_DURATION_HOURS));
        let repeat = self
            .repeat
            .unwrap_or_else(|| RepeatKind::None.as_str().to_string());

        let takes_frequency =
            RepeatKind::parse(&repeat).is_some_and(|kind| kind.rules().accepts_frequency());
        let frequency = match self.frequency {
            None if takes_frequency => Some(Value::from(1)),
            other => other,
        };

        EventSpecification {
            id: uuid::Uuid::now_v7(),
            description: self.description,
            start_at,
            end_at,
            repeat,
            frequency,
            on: self.on,
            on_the: self.on_the,
            target: self.target,
            until: self.until,
            rrule: None,
            attributes: Value::Object(self.attributes),
            created_at: now,
            updated_at: now,
        }
    }
}
