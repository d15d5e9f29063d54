use tracing::info;

use super::{Portal, PortalError, Session};
use crate::db::PortalRepository;
use crate::models::{NewUser, ServiceCategory, User, UserRole};

impl<R: PortalRepository + ?Sized> Portal<'_, R> {
    /// Admin: onboard a consultant with their practice areas.
    pub async fn create_consultant(
        &self,
        session: &Session,
        email: &str,
        name: &str,
        specializations: Vec<ServiceCategory>,
    ) -> Result<User, PortalError> {
        session.require(UserRole::Admin)?;
        let new_user = NewUser {
            email: email.to_string(),
            name: name.to_string(),
            role: UserRole::Consultant,
            specializations,
        }
        .normalized()?;
        let user = self.repo.create_user(new_user).await?;
        info!(user_id = user.id, email = %user.email, "consultant created");
        Ok(user)
    }

    pub async fn set_user_role(
        &self,
        session: &Session,
        user_id: i64,
        role: UserRole,
    ) -> Result<User, PortalError> {
        session.require(UserRole::Admin)?;
        if user_id == session.user_id() {
            return Err(PortalError::forbidden("admins cannot change their own role"));
        }
        let mut user = self.repo.get_user(user_id).await?;
        let previous = user.role;
        user.role = role;
        self.repo.update_user(&user).await?;
        info!(user_id, from = %previous, to = %role, "user role changed");
        Ok(user)
    }

    /// Admin: block the account from opening new sessions. Requests it
    /// owns or is assigned to are left as they are.
    pub async fn deactivate_user(
        &self,
        session: &Session,
        user_id: i64,
    ) -> Result<User, PortalError> {
        session.require(UserRole::Admin)?;
        if user_id == session.user_id() {
            return Err(PortalError::forbidden("admins cannot deactivate themselves"));
        }
        let mut user = self.repo.get_user(user_id).await?;
        user.is_active = false;
        self.repo.update_user(&user).await?;
        info!(user_id, "user deactivated");
        Ok(user)
    }

    pub async fn list_users(
        &self,
        session: &Session,
        role: Option<UserRole>,
    ) -> Result<Vec<User>, PortalError> {
        session.require(UserRole::Admin)?;
        Ok(self.repo.list_users(role).await?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::RepositoryError;
    use crate::models::UserValidationError;
    use crate::portal::test_support::{ADMIN, CONSULTANT, seeded};

    #[tokio::test]
    async fn create_consultant_normalizes_input() {
        let (repo, _) = seeded().await;
        let admin = Session::open(&repo, ADMIN).await.unwrap();

        let user = Portal::new(&repo)
            .create_consultant(&admin, " Ravi@Example.com", " Ravi Iyer ", vec![ServiceCategory::Gst])
            .await
            .unwrap();

        assert_eq!(user.email, "ravi@example.com");
        assert_eq!(user.name, "Ravi Iyer");
        assert_eq!(user.role, UserRole::Consultant);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn duplicate_or_invalid_email_rejected() {
        let (repo, _) = seeded().await;
        let admin = Session::open(&repo, ADMIN).await.unwrap();
        let portal = Portal::new(&repo);

        assert!(matches!(
            portal.create_consultant(&admin, CONSULTANT, "Again", vec![]).await,
            Err(PortalError::Repository(RepositoryError::Conflict(_)))
        ));
        assert!(matches!(
            portal.create_consultant(&admin, "not-an-email", "Bad", vec![]).await,
            Err(PortalError::UserValidation(UserValidationError::InvalidEmail(_)))
        ));
    }

    #[tokio::test]
    async fn consultant_cannot_list_users() {
        let (repo, _) = seeded().await;
        let consultant = Session::open(&repo, CONSULTANT).await.unwrap();

        assert!(matches!(
            Portal::new(&repo).list_users(&consultant, None).await,
            Err(PortalError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn role_change_and_listing() {
        let (repo, ids) = seeded().await;
        let admin = Session::open(&repo, ADMIN).await.unwrap();
        let portal = Portal::new(&repo);

        portal.set_user_role(&admin, ids.customer, UserRole::Consultant).await.unwrap();

        let consultants = portal.list_users(&admin, Some(UserRole::Consultant)).await.unwrap();
        assert_eq!(consultants.len(), 2);
        assert_eq!(portal.list_users(&admin, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn admin_cannot_demote_or_deactivate_self() {
        let (repo, ids) = seeded().await;
        let admin = Session::open(&repo, ADMIN).await.unwrap();
        let portal = Portal::new(&repo);

        assert!(matches!(
            portal.set_user_role(&admin, ids.admin, UserRole::Customer).await,
            Err(PortalError::Forbidden(_))
        ));
        assert!(matches!(
            portal.deactivate_user(&admin, ids.admin).await,
            Err(PortalError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn deactivated_user_is_locked_out() {
        let (repo, ids) = seeded().await;
        let admin = Session::open(&repo, ADMIN).await.unwrap();

        let user = Portal::new(&repo).deactivate_user(&admin, ids.consultant).await.unwrap();

        assert!(!user.is_active);
        assert!(matches!(
            Session::open(&repo, CONSULTANT).await,
            Err(PortalError::InactiveUser(_))
        ));
    }
}
