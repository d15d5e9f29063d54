//! Process-local repository backend.
//!
//! Keeps everything in a `Mutex`-guarded set of vectors. Used by the `memory`
//! backend for demos and throw-away sessions, and by the portal tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{PortalRepository, RepositoryError, RequestFilter};
use crate::models::{
    EntityType, Message, NewMessage, NewServicePackage, NewServiceRequest, NewUser, RequestStatus, ServiceCategory,
    ServicePackage, ServicePackageRecord, ServiceRequest, ServiceRequestRecord, ServiceType, User,
    UserRole,
};
use crate::rate_card::RateCardKey;

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    packages: Vec<ServicePackage>,
    requests: Vec<ServiceRequest>,
    messages: Vec<Message>,
    next_user_id: i64,
    next_package_id: i64,
    next_request_id: i64,
    next_message_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn insert_package(
    state: &mut MemoryState,
    package: NewServicePackage,
) -> ServicePackage {
    let now = Utc::now();
    let created: ServicePackage = ServicePackageRecord {
        id: next_id(&mut state.next_package_id),
        key: package.key(),
        stored_price: package.price(),
        name: package.name,
        description: package.description,
        is_active: package.is_active,
        created_at: now,
        updated_at: now,
    }
    .into();
    state.packages.push(created.clone());
    created
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the demo accounts (one per role) and the starter package
    /// catalogue, matching what the SQLite backend seeds.
    pub async fn seed_demo_data(&self) -> Result<(), RepositoryError> {
        let users = [
            ("customer@example.com", "John Customer", UserRole::Customer, vec![]),
            (
                "consultant@example.com",
                "Jane Consultant",
                UserRole::Consultant,
                vec![ServiceCategory::IncomeTax, ServiceCategory::Gst],
            ),
            ("admin@example.com", "Admin User", UserRole::Admin, vec![]),
        ];
        for (email, name, role, specializations) in users {
            self.create_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                role,
                specializations,
            })
            .await?;
        }

        let packages = [
            (
                "Notice Reply - Individual",
                "Drafting and filing a reply to an income-tax notice",
                (1, EntityType::Individual, ServiceType::Notices),
            ),
            (
                "Scrutiny Assessment - Company",
                "Representation in scrutiny assessment proceedings",
                (2, EntityType::Company, ServiceType::Assessment),
            ),
            (
                "Transfer Pricing Defence",
                "Transfer pricing documentation and hearings",
                (3, EntityType::Company, ServiceType::Transfer),
            ),
        ];
        for (name, description, (slab, entity, service)) in packages {
            let key = RateCardKey::new(slab, entity, service)
                .map_err(|e| RepositoryError::Configuration(e.to_string()))?;
            self.create_package(NewServicePackage::new(name, description, key, true))
                .await?;
        }
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Database("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PortalRepository for InMemoryRepository {
    async fn create_user(
        &self,
        user: NewUser,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state()?;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        let created = User {
            id: next_id(&mut state.next_user_id),
            email: user.email,
            name: user.name,
            role: user.role,
            specializations: user.specializations,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn get_user(
        &self,
        id: i64,
    ) -> Result<User, RepositoryError> {
        self.state()?
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<User, RepositoryError> {
        let email = email.trim().to_lowercase();
        self.state()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_users(
        &self,
        role: Option<UserRole>,
    ) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .state()?
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn update_user(
        &self,
        user: &User,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let slot = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn create_package(
        &self,
        package: NewServicePackage,
    ) -> Result<ServicePackage, RepositoryError> {
        let mut state = self.state()?;
        Ok(insert_package(&mut state, package))
    }

    async fn create_packages(
        &self,
        packages: Vec<NewServicePackage>,
    ) -> Result<Vec<ServicePackage>, RepositoryError> {
        let mut state = self.state()?;
        Ok(packages
            .into_iter()
            .map(|package| insert_package(&mut state, package))
            .collect())
    }

    async fn get_package(
        &self,
        id: i64,
    ) -> Result<ServicePackage, RepositoryError> {
        self.state()?
            .packages
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_package(
        &self,
        package: &ServicePackage,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let slot = state
            .packages
            .iter_mut()
            .find(|p| p.id == package.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = package.clone();
        slot.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_package(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.packages.len();
        state.packages.retain(|p| p.id != id);
        if state.packages.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_packages(
        &self,
        active_only: bool,
    ) -> Result<Vec<ServicePackage>, RepositoryError> {
        Ok(self
            .state()?
            .packages
            .iter()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect())
    }

    async fn create_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, RepositoryError> {
        let mut state = self.state()?;
        if !state.users.iter().any(|u| u.id == request.customer_id) {
            return Err(RepositoryError::Conflict(format!(
                "customer {} does not exist",
                request.customer_id
            )));
        }
        let now = Utc::now();
        let created: ServiceRequest = ServiceRequestRecord {
            id: next_id(&mut state.next_request_id),
            customer_id: request.customer_id,
            key: request.key(),
            stored_fee: request.fee(),
            title: request.title,
            description: request.description,
            category: request.category,
            status: RequestStatus::Pending,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
        .into();
        state.requests.push(created.clone());
        Ok(created)
    }

    async fn get_request(
        &self,
        id: i64,
    ) -> Result<ServiceRequest, RepositoryError> {
        self.state()?
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_request(
        &self,
        request: &ServiceRequest,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let slot = state
            .requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = request.clone();
        Ok(())
    }

    async fn delete_request(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.requests.len();
        state.requests.retain(|r| r.id != id);
        if state.requests.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state.messages.retain(|m| m.request_id != id);
        Ok(())
    }

    async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<ServiceRequest>, RepositoryError> {
        Ok(self
            .state()?
            .requests
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create_message(
        &self,
        message: NewMessage,
    ) -> Result<Message, RepositoryError> {
        let mut state = self.state()?;
        if !state.requests.iter().any(|r| r.id == message.request_id) {
            return Err(RepositoryError::Conflict(format!(
                "request {} does not exist",
                message.request_id
            )));
        }
        if !state.users.iter().any(|u| u.id == message.sender_id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} does not exist",
                message.sender_id
            )));
        }
        let created = Message {
            id: next_id(&mut state.next_message_id),
            request_id: message.request_id,
            sender_id: message.sender_id,
            content: message.content,
            is_read: false,
            created_at: Utc::now(),
        };
        state.messages.push(created.clone());
        Ok(created)
    }

    async fn get_message(
        &self,
        id: i64,
    ) -> Result<Message, RepositoryError> {
        self.state()?
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_messages(
        &self,
        request_id: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .state()?
            .messages
            .iter()
            .filter(|m| m.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn set_message_read(
        &self,
        id: i64,
        is_read: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(RepositoryError::NotFound)?;
        message.is_read = is_read;
        Ok(())
    }

    async fn delete_message(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        if state.messages.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// [`RepositoryFactory`] for the `memory` backend. Every `create` call
/// returns a fresh store holding only the demo data; `connection_string` is
/// ignored.
pub struct InMemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for InMemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn PortalRepository>, RepositoryError> {
        let repo = InMemoryRepository::new();
        repo.seed_demo_data().await?;
        Ok(Box::new(repo))
    }
}
