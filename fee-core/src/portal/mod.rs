//! Role-checked operations over a [`PortalRepository`].
//!
//! Every operation takes the caller's [`Session`] and fails with
//! [`PortalError::Forbidden`] when the session's role (or ownership of the
//! record) does not cover it. Prices and fees always come from the rate
//! card; callers only ever pass keys.

mod dashboard;
mod error;
mod messages;
mod packages;
mod requests;
mod session;
mod users;

pub use dashboard::DashboardStats;
pub use error::PortalError;
pub use packages::PackageDraft;
pub use requests::RequestDraft;
pub use session::Session;

use crate::db::PortalRepository;

/// Portal service. Holds no state besides the repository handle.
pub struct Portal<'r, R: ?Sized> {
    repo: &'r R,
}

impl<'r, R: PortalRepository + ?Sized> Portal<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &'r R {
        self.repo
    }
}

/// Trims `value` and rejects it if nothing is left.
fn require_text(
    field: &str,
    value: String,
) -> Result<String, PortalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
