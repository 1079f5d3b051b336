//! Enforces the legality matrix against a candidate specification.
//!
//! Parameters arrive loosely typed (as submitted by the owner), so shape checks
//! happen here: a scalar where a collection is required, a non-numeric
//! frequency, or an unknown ordinal each report against their own field.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::grammar::{
    DayClass, Field, KindRules, Ordinal, Presence, RepeatKind, Shape, Target, Weekday,
};
use super::recurrence::{Nth, Recurrence};

/// Recurrence parameters exactly as the owner supplied them.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceParams<'a> {
    pub repeat: &'a str,
    pub frequency: Option<&'a Value>,
    pub on: Option<&'a Value>,
    pub on_the: Option<&'a Value>,
    pub target: Option<&'a Value>,
}

/// Everything the validator looks at on a specification.
#[derive(Debug, Clone, Copy)]
pub struct SpecificationInput<'a> {
    pub description: Option<&'a str>,
    pub start_at: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
    pub params: RecurrenceParams<'a>,
}

/// Field name to human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<Field, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// Messages attached to a field (empty when the field is fine).
    #[must_use]
    pub fn get(&self, field: Field) -> &[String] {
        self.fields.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (*field, messages.as_slice()))
    }

    /// Returns the errors keyed by field name.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, Vec<String>> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.clone()))
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// ## Summary
/// Validates a whole specification and returns its typed recurrence.
///
/// Runs every check in one pass; violations on several fields are all reported.
///
/// ## Errors
/// Returns the collected `ValidationErrors` when any field is invalid.
pub fn validate_specification(
    input: &SpecificationInput<'_>,
) -> Result<Recurrence, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if input.description.is_none_or(|d| d.trim().is_empty()) {
        errors.add(Field::Description, "can't be blank");
    }

    if let Some(until) = input.until
        && until < input.start_at
    {
        errors.add(Field::Until, "must be at or after start_at");
    }

    let recurrence = validate_recurrence(&input.params, &mut errors);

    match recurrence {
        Some(recurrence) if errors.is_empty() => Ok(recurrence),
        _ => Err(errors),
    }
}

/// ## Summary
/// Checks recurrence parameters against the legality matrix.
///
/// Errors are appended to `errors`; `None` is returned if any were found.
pub fn validate_recurrence(
    params: &RecurrenceParams<'_>,
    errors: &mut ValidationErrors,
) -> Option<Recurrence> {
    let Some(kind) = RepeatKind::parse(params.repeat) else {
        errors.add(
            Field::Repeat,
            format!("{} is not a valid repeat kind", params.repeat),
        );
        return None;
    };
    let rules = kind.rules();
    let before = errors.clone();

    let on_the_given = present(params.on_the).is_some();
    let checker = Checker { kind, on_the_given };

    let frequency = checker.check(errors, Field::Frequency, rules.frequency, params.frequency);
    let on = checker.check(errors, Field::On, rules.on, params.on);
    let on_the = checker.check(errors, Field::OnThe, rules.on_the, params.on_the);
    let target = checker.check(errors, Field::Target, rules.target, params.target);

    if rules.on_excludes_on_the && present(params.on).is_some() && on_the_given {
        errors.add(Field::On, "can't be combined with on_the");
    }

    if *errors != before {
        tracing::trace!(repeat = %kind, errors = %errors, "Recurrence parameters rejected");
        return None;
    }

    build(
        rules,
        Checked {
            frequency,
            on,
            on_the,
            target,
        },
    )
}

/// A parameter value that matched its expected shape.
#[derive(Debug, Clone)]
enum Parsed {
    Interval(u16),
    Hours(Vec<u8>),
    Weekdays(Vec<Weekday>),
    MonthDays(Vec<u8>),
    Months(Vec<u8>),
    Ordinal(Ordinal),
    Target(Target),
}

struct Checked {
    frequency: Option<Parsed>,
    on: Option<Parsed>,
    on_the: Option<Parsed>,
    target: Option<Parsed>,
}

#[derive(Clone, Copy)]
struct Checker {
    kind: RepeatKind,
    on_the_given: bool,
}

impl Checker {
    fn check(
        self,
        errors: &mut ValidationErrors,
        field: Field,
        presence: Presence,
        value: Option<&Value>,
    ) -> Option<Parsed> {
        let value = present(value);
        let shape = match (presence, value) {
            (Presence::Forbidden | Presence::Optional(_), None) => return None,
            (Presence::Forbidden, Some(_)) => {
                errors.add(field, format!("is not allowed when repeat is {}", self.kind));
                return None;
            }
            (Presence::Required(_), None) => {
                errors.add(field, "can't be blank");
                return None;
            }
            (Presence::WithOnThe(_), None) => {
                if self.on_the_given {
                    errors.add(field, "can't be blank when on_the is given");
                    errors.add(Field::OnThe, "needs a target");
                }
                return None;
            }
            (Presence::WithOnThe(_), Some(_)) if !self.on_the_given => {
                errors.add(field, "is only allowed together with on_the");
                return None;
            }
            (
                Presence::Optional(shape) | Presence::Required(shape) | Presence::WithOnThe(shape),
                Some(_),
            ) => shape,
        };

        match parse_shape(shape, value?) {
            Ok(parsed) => Some(parsed),
            Err(message) => {
                errors.add(field, message);
                None
            }
        }
    }
}

/// JSON `null` counts as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn parse_shape(shape: Shape, value: &Value) -> Result<Parsed, String> {
    match shape {
        Shape::Interval => parse_interval(value).map(Parsed::Interval),
        Shape::Hours => integer_list(value, 0, 23, "hours").map(Parsed::Hours),
        Shape::MonthDays => integer_list(value, 1, 31, "days of the month").map(Parsed::MonthDays),
        Shape::Months => integer_list(value, 1, 12, "months").map(Parsed::Months),
        Shape::Weekdays => weekday_list(value).map(Parsed::Weekdays),
        Shape::Ordinal => value
            .as_str()
            .and_then(Ordinal::parse)
            .map(Parsed::Ordinal)
            .ok_or_else(|| "must be one of first, second, third, fourth or last".to_string()),
        Shape::DayTarget => parse_target(value).map(Parsed::Target),
    }
}

fn parse_interval(value: &Value) -> Result<u16, String> {
    let number = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| "is not a number".to_string())?;

    if number < 1 {
        return Err("must be greater than 0".to_string());
    }
    u16::try_from(number).map_err(|e| format!("is too large: {e}"))
}

fn integer_list(value: &Value, min: u8, max: u8, noun: &str) -> Result<Vec<u8>, String> {
    let Value::Array(items) = value else {
        return Err(format!("must be a list of {noun}"));
    };
    if items.is_empty() {
        return Err(format!("must list at least one of the {noun}"));
    }
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .filter(|n| (min..=max).contains(n))
                .ok_or_else(|| format!("{item} is not valid; {noun} range from {min} to {max}"))
        })
        .collect()
}

fn weekday_list(value: &Value) -> Result<Vec<Weekday>, String> {
    let Value::Array(items) = value else {
        return Err("must be a list of weekdays".to_string());
    };
    if items.is_empty() {
        return Err("must list at least one weekday".to_string());
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(Weekday::parse)
                .ok_or_else(|| format!("{item} is not a weekday (mo, tu, we, th, fr, sa, su)"))
        })
        .collect()
}

fn parse_target(value: &Value) -> Result<Target, String> {
    match value {
        Value::String(s) => DayClass::parse(s)
            .map(Target::Class)
            .ok_or_else(|| "must be wkday, wkend or a list of weekdays".to_string()),
        Value::Array(_) => weekday_list(value).map(Target::Days),
        _ => Err("must be wkday, wkend or a list of weekdays".to_string()),
    }
}

fn build(rules: &KindRules, checked: Checked) -> Option<Recurrence> {
    let interval = match checked.frequency {
        Some(Parsed::Interval(interval)) => interval,
        _ => 1,
    };
    let nth = match (checked.on_the, checked.target.clone()) {
        (Some(Parsed::Ordinal(ordinal)), Some(Parsed::Target(target))) => {
            Some(Nth { ordinal, target })
        }
        _ => None,
    };

    Some(match rules.kind {
        RepeatKind::None => Recurrence::None,
        RepeatKind::ByHour => {
            let Some(Parsed::Hours(hours)) = checked.target else {
                return None;
            };
            Recurrence::ByHour { hours }
        }
        RepeatKind::Daily => Recurrence::Daily { interval },
        RepeatKind::Weekly => Recurrence::Weekly {
            interval,
            days: match checked.on {
                Some(Parsed::Weekdays(days)) => days,
                _ => Vec::new(),
            },
        },
        RepeatKind::Monthly => Recurrence::Monthly {
            interval,
            days: match checked.on {
                Some(Parsed::MonthDays(days)) => days,
                _ => Vec::new(),
            },
            nth,
        },
        RepeatKind::Yearly => Recurrence::Yearly {
            interval,
            months: match checked.on {
                Some(Parsed::Months(months)) => months,
                _ => Vec::new(),
            },
            nth,
        },
    })
}
