use tracing::info;

use super::{Portal, PortalError, Session, require_text};
use crate::db::PortalRepository;
use crate::models::{NewServicePackage, ServicePackage, ServicePackageUpdate, UserRole};
use crate::rate_card::RateCardKey;

/// What an admin fills in when creating a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDraft {
    pub name: String,
    pub description: String,
    pub key: RateCardKey,
    pub is_active: bool,
}

impl<R: PortalRepository + ?Sized> Portal<'_, R> {
    pub async fn create_package(
        &self,
        session: &Session,
        draft: PackageDraft,
    ) -> Result<ServicePackage, PortalError> {
        session.require(UserRole::Admin)?;
        let name = require_text("package name", draft.name)?;
        let package = self
            .repo
            .create_package(NewServicePackage::new(
                name,
                draft.description.trim(),
                draft.key,
                draft.is_active,
            ))
            .await?;
        info!(
            package_id = package.id,
            key = %package.key(),
            price = %package.price(),
            "package created"
        );
        Ok(package)
    }

    /// Apply a partial edit; a new key reprices the package.
    pub async fn update_package(
        &self,
        session: &Session,
        package_id: i64,
        mut update: ServicePackageUpdate,
    ) -> Result<ServicePackage, PortalError> {
        session.require(UserRole::Admin)?;
        if let Some(name) = update.name.take() {
            update.name = Some(require_text("package name", name)?);
        }
        let mut package = self.repo.get_package(package_id).await?;
        package.apply(update);
        self.repo.update_package(&package).await?;
        info!(package_id, price = %package.price(), "package updated");
        Ok(package)
    }

    pub async fn set_package_active(
        &self,
        session: &Session,
        package_id: i64,
        is_active: bool,
    ) -> Result<ServicePackage, PortalError> {
        self.update_package(
            session,
            package_id,
            ServicePackageUpdate {
                is_active: Some(is_active),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_package(
        &self,
        session: &Session,
        package_id: i64,
    ) -> Result<(), PortalError> {
        session.require(UserRole::Admin)?;
        self.repo.delete_package(package_id).await?;
        info!(package_id, "package deleted");
        Ok(())
    }

    /// Admins see every package; everyone else only the active ones.
    pub async fn list_packages(
        &self,
        session: &Session,
    ) -> Result<Vec<ServicePackage>, PortalError> {
        let active_only = session.role() != UserRole::Admin;
        Ok(self.repo.list_packages(active_only).await?)
    }
}
