use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::{UnknownVariant, UserValidationError, WorkflowError};
use crate::rate_card::RateCardError;

/// Everything a portal operation can fail with.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    RateCard(#[from] RateCardError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    UserValidation(#[from] UserValidationError),

    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    /// The session's role or ownership does not cover the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("no user with email '{0}'")]
    UnknownUser(String),

    #[error("user '{0}' is deactivated")]
    InactiveUser(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl PortalError {
    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
