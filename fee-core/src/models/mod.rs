mod entity_type;
mod income_slab;
mod message;
mod service_package;
mod service_request;
mod service_type;
mod user;

use thiserror::Error;

pub use entity_type::EntityType;
pub use income_slab::{
    INCOME_SLABS, IncomeSlab, SlabClassification, SlabClassificationError, SlabId, classify_slab,
    income_slabs,
};
pub use message::{Message, NewMessage};
pub use service_package::{
    NewServicePackage, ServicePackage, ServicePackageRecord, ServicePackageUpdate,
};
pub use service_request::{
    NewServiceRequest, RequestStatus, ServiceCategory, ServiceRequest, ServiceRequestEdit,
    ServiceRequestRecord, StatusBucket, WorkflowError,
};
pub use service_type::ServiceType;
pub use user::{NewUser, User, UserRole, UserValidationError};

/// A string did not name any variant of a closed enumeration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(
        kind: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
