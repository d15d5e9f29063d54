use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Message, NewMessage, NewServicePackage, NewServiceRequest, NewUser, RequestStatus,
    ServicePackage, ServiceRequest, User, UserRole,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Narrows `list_requests`; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub customer_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub status: Option<RequestStatus>,
}

impl RequestFilter {
    pub fn for_customer(customer_id: i64) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn for_consultant(consultant_id: i64) -> Self {
        Self {
            assigned_to: Some(consultant_id),
            ..Self::default()
        }
    }

    pub fn with_status(
        mut self,
        status: Option<RequestStatus>,
    ) -> Self {
        self.status = status;
        self
    }

    pub fn matches(
        &self,
        request: &ServiceRequest,
    ) -> bool {
        self.customer_id.is_none_or(|id| request.customer_id == id)
            && self.assigned_to.is_none_or(|id| request.assigned_to() == Some(id))
            && self.status.is_none_or(|status| request.status() == status)
    }
}

/// Storage for users, packages, requests and request messages.
///
/// Implementations persist the derived price/fee next to the key fields but
/// must rebuild models through `ServicePackageRecord` / `ServiceRequestRecord`
/// so the rate card stays authoritative.
#[async_trait]
pub trait PortalRepository: Send + Sync {
    // Users
    async fn create_user(
        &self,
        user: NewUser,
    ) -> Result<User, RepositoryError>;
    async fn get_user(
        &self,
        id: i64,
    ) -> Result<User, RepositoryError>;
    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<User, RepositoryError>;
    async fn list_users(
        &self,
        role: Option<UserRole>,
    ) -> Result<Vec<User>, RepositoryError>;
    async fn update_user(
        &self,
        user: &User,
    ) -> Result<(), RepositoryError>;

    // Service packages
    async fn create_package(
        &self,
        package: NewServicePackage,
    ) -> Result<ServicePackage, RepositoryError>;
    /// Create every package or none of them.
    async fn create_packages(
        &self,
        packages: Vec<NewServicePackage>,
    ) -> Result<Vec<ServicePackage>, RepositoryError>;
    async fn get_package(
        &self,
        id: i64,
    ) -> Result<ServicePackage, RepositoryError>;
    async fn update_package(
        &self,
        package: &ServicePackage,
    ) -> Result<(), RepositoryError>;
    async fn delete_package(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;
    async fn list_packages(
        &self,
        active_only: bool,
    ) -> Result<Vec<ServicePackage>, RepositoryError>;

    // Service requests
    async fn create_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, RepositoryError>;
    async fn get_request(
        &self,
        id: i64,
    ) -> Result<ServiceRequest, RepositoryError>;
    async fn update_request(
        &self,
        request: &ServiceRequest,
    ) -> Result<(), RepositoryError>;
    /// Deleting a request also deletes its messages.
    async fn delete_request(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;
    async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<ServiceRequest>, RepositoryError>;

    // Request messages
    async fn create_message(
        &self,
        message: NewMessage,
    ) -> Result<Message, RepositoryError>;
    async fn get_message(
        &self,
        id: i64,
    ) -> Result<Message, RepositoryError>;
    /// Oldest first.
    async fn list_messages(
        &self,
        request_id: i64,
    ) -> Result<Vec<Message>, RepositoryError>;
    async fn set_message_read(
        &self,
        id: i64,
        is_read: bool,
    ) -> Result<(), RepositoryError>;
    async fn delete_message(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;
}
