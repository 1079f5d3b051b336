use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde_json::{Map, Value};

use super::specification::EventSpecification;
use crate::db::schema;

/// One materialized instance of a specification.
///
/// `(specification_id, start_at)` is unique.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = schema::event_occurrence)]
#[diesel(check_for_backend(Pg))]
pub struct EventOccurrence {
    pub id: uuid::Uuid,
    pub specification_id: uuid::Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub description: Option<String>,
    pub attributes: Value,
}

impl EventOccurrence {
    /// Copies the specification's base fields and mirrored attributes onto a
    /// new occurrence starting at `start_at`.
    #[must_use]
    pub fn from_specification(spec: &EventSpecification, start_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            specification_id: spec.id,
            start_at,
            end_at: start_at + spec.duration(),
            description: spec.description.clone(),
            attributes: Value::Object(spec.mirrored_attributes()),
        }
    }

    /// ## Summary
    /// Overlays caller-supplied values.
    ///
    /// `description` and `end_at` replace base fields; every other key lands
    /// in the attribute map, replacing any mirrored value. Numbers and booleans
    /// given as a description are rendered as text; other non-string values
    /// leave the description untouched.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) {
        for (key, value) in overrides {
            match key.as_str() {
                "description" => match value {
                    Value::String(text) => self.description = Some(text.clone()),
                    Value::Number(_) | Value::Bool(_) => {
                        self.description = Some(value.to_string());
                    }
                    Value::Null | Value::Array(_) | Value::Object(_) => {
                        tracing::warn!(%value, "Ignoring non-scalar description override");
                    }
                },
                "end_at" => match serde_json::from_value::<DateTime<Utc>>(value.clone()) {
                    Ok(end_at) => self.end_at = end_at,
                    Err(e) => {
                        tracing::warn!(%value, error = %e, "Ignoring unparseable end_at override");
                    }
                },
                _ => {
                    if !self.attributes.is_object() {
                        self.attributes = Value::Object(Map::new());
                    }
                    if let Value::Object(map) = &mut self.attributes {
                        map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::specification::SpecificationDraft;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    fn spec() -> EventSpecification {
        let start = Utc.with_ymd_and_hms(2011, 1, 15, 12, 0, 0).unwrap();
        SpecificationDraft::new("walk the dog")
            .start_at(start)
            .end_at(start + TimeDelta::minutes(45))
            .attribute("added_string", "foo")
            .attribute("added_boolean", true)
            .build(start)
    }

    #[test]
    fn mirrors_base_fields_and_duration() {
        let spec = spec();
        let start = spec.start_at + TimeDelta::days(2);
        let occurrence = EventOccurrence::from_specification(&spec, start);

        assert_eq!(occurrence.specification_id, spec.id);
        assert_eq!(occurrence.end_at, start + TimeDelta::minutes(45));
        assert_eq!(occurrence.description.as_deref(), Some("walk the dog"));
        assert_eq!(occurrence.attribute("added_string"), Some(&json!("foo")));
    }

    #[test]
    fn overrides_win_over_mirrored_values() {
        let spec = spec();
        let mut occurrence = EventOccurrence::from_specification(&spec, spec.start_at);
        let overrides = json!({
            "description": "something new",
            "added_string": "something else new",
            "end_at": "2011-01-15T15:00:00Z",
        });
        let Value::Object(overrides) = overrides else {
            unreachable!()
        };
        occurrence.apply_overrides(&overrides);

        assert_eq!(occurrence.description.as_deref(), Some("something new"));
        assert_eq!(
            occurrence.attribute("added_string"),
            Some(&json!("something else new"))
        );
        assert_eq!(occurrence.attribute("added_boolean"), Some(&json!(true)));
        assert_eq!(
            occurrence.end_at,
            Utc.with_ymd_and_hms(2011, 1, 15, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn scalar_description_overrides_are_rendered_as_text() {
        let spec = spec();
        let mut occurrence = EventOccurrence::from_specification(&spec, spec.start_at);

        let Value::Object(number) = json!({ "description": 42 }) else {
            unreachable!()
        };
        occurrence.apply_overrides(&number);
        assert_eq!(occurrence.description.as_deref(), Some("42"));

        let Value::Object(flag) = json!({ "description": false }) else {
            unreachable!()
        };
        occurrence.apply_overrides(&flag);
        assert_eq!(occurrence.description.as_deref(), Some("false"));
    }

    #[test]
    fn null_or_structured_description_overrides_keep_the_description() {
        let spec = spec();
        let mut occurrence = EventOccurrence::from_specification(&spec, spec.start_at);

        for value in [json!(null), json!({ "text": "nested" }), json!(["a"])] {
            let mut overrides = Map::new();
            overrides.insert("description".to_string(), value);
            occurrence.apply_overrides(&overrides);

            assert_eq!(occurrence.description.as_deref(), Some("walk the dog"));
        }
    }
}
