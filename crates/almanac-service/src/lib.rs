//! Occurrence materialization on top of the rule engine and the store.

pub mod context;
pub mod error;
pub mod generation;
pub mod specification;

pub use context::{GenerateDirective, GenerateOptions, TimeContext};
pub use generation::{BatchReport, Generated, generate_all, generate_events};
pub use specification::{Saved, create_specification, occurrences, update_specification};
