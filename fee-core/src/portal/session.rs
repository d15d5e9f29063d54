use tracing::debug;

use super::PortalError;
use crate::db::{PortalRepository, RepositoryError};
use crate::models::{User, UserRole};

/// The signed-in user every portal operation acts on behalf of.
///
/// Identity is established by the caller; a session only checks that the
/// user exists and is active. No credentials are involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
}

impl Session {
    /// Wrap an already-resolved user.
    ///
    /// # Errors
    /// [`PortalError::InactiveUser`] if the account has been deactivated.
    pub fn new(user: User) -> Result<Self, PortalError> {
        if !user.is_active {
            return Err(PortalError::InactiveUser(user.email));
        }
        Ok(Self { user })
    }

    /// Resolve `email` through the repository and open a session for it.
    pub async fn open<R: PortalRepository + ?Sized>(
        repo: &R,
        email: &str,
    ) -> Result<Self, PortalError> {
        let user = match repo.get_user_by_email(email).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => {
                return Err(PortalError::UnknownUser(email.trim().to_lowercase()));
            }
            Err(e) => return Err(e.into()),
        };
        debug!(user_id = user.id, role = %user.role, "session opened");
        Self::new(user)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    /// Fail with [`PortalError::Forbidden`] unless the session has `role`.
    pub fn require(
        &self,
        role: UserRole,
    ) -> Result<(), PortalError> {
        if self.user.role == role {
            Ok(())
        } else {
            Err(PortalError::forbidden(format!(
                "{role} role required; {} is a {}",
                self.user.email, self.user.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::portal::test_support::{ADMIN, CUSTOMER, seeded};

    #[tokio::test]
    async fn open_resolves_email_case_insensitively() {
        let (repo, _) = seeded().await;

        let session = Session::open(&repo, " Customer@Example.com ").await.unwrap();

        assert_eq!(session.user().email, CUSTOMER);
        assert_eq!(session.role(), UserRole::Customer);
    }

    #[tokio::test]
    async fn open_unknown_email_fails() {
        let (repo, _) = seeded().await;

        let err = Session::open(&repo, "nobody@example.com").await.unwrap_err();

        assert!(matches!(err, PortalError::UnknownUser(email) if email == "nobody@example.com"));
    }

    #[tokio::test]
    async fn inactive_user_cannot_open_session() {
        let (repo, ids) = seeded().await;
        let mut admin = repo.get_user(ids.admin).await.unwrap();
        admin.is_active = false;
        repo.update_user(&admin).await.unwrap();

        let err = Session::open(&repo, ADMIN).await.unwrap_err();

        assert!(matches!(err, PortalError::InactiveUser(_)));
    }

    #[tokio::test]
    async fn require_checks_role() {
        let (repo, _) = seeded().await;
        let session = Session::open(&repo, CUSTOMER).await.unwrap();

        assert!(session.require(UserRole::Customer).is_ok());
        let err = session.require(UserRole::Admin).unwrap_err();
        assert_eq!(
            err.to_string(),
            "forbidden: admin role required; customer@example.com is a customer"
        );
    }
}
