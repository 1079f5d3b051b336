//! Recurrence rule engine: grammar, validation, canonical rule compilation and
//! occurrence expansion.

pub mod error;
pub mod rule;
