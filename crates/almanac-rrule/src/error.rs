use thiserror::Error;

/// Rule compilation and expansion errors
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Expansion error: {0}")]
    ExpansionError(String),
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
