use almanac_rrule::rule::ValidationErrors;
use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Generation was requested for a specification that fails validation.
    #[error("Invalid specification: {0}")]
    InvalidSpecification(ValidationErrors),

    #[error(transparent)]
    DatabaseError(#[from] almanac_db::error::DbError),

    #[error(transparent)]
    RuleError(#[from] almanac_rrule::error::RuleError),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
