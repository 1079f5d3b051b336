//! Recurrence rules: grammar, validation, compilation and expansion.

pub mod compile;
pub mod expand;
pub mod grammar;
pub mod recurrence;
pub mod validate;

pub use compile::{CompiledRule, Frequency, compile};
pub use expand::{Expansion, Window, by_hour_start, expand};
pub use grammar::{DayClass, Field, Ordinal, RepeatKind, Target, Weekday};
pub use recurrence::{Nth, Recurrence};
pub use validate::{
    RecurrenceParams, SpecificationInput, ValidationErrors, validate_recurrence,
    validate_specification,
};
