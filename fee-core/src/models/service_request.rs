use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::UnknownVariant;
use crate::rate_card::RateCardKey;

/// Area of tax practice a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCategory {
    #[serde(rename = "Income Tax")]
    IncomeTax,
    #[serde(rename = "GST")]
    Gst,
    #[serde(rename = "Corporate Tax")]
    CorporateTax,
    #[serde(rename = "International Tax")]
    InternationalTax,
    #[serde(rename = "Tax Appeals")]
    TaxAppeals,
    Other,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 6] = [
        ServiceCategory::IncomeTax,
        ServiceCategory::Gst,
        ServiceCategory::CorporateTax,
        ServiceCategory::InternationalTax,
        ServiceCategory::TaxAppeals,
        ServiceCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeTax => "Income Tax",
            Self::Gst => "GST",
            Self::CorporateTax => "Corporate Tax",
            Self::InternationalTax => "International Tax",
            Self::TaxAppeals => "Tax Appeals",
            Self::Other => "Other",
        }
    }
}

impl FromStr for ServiceCategory {
    type Err = UnknownVariant;

    /// Accepts the display name in any case, with `-` or `_` in place of
    /// spaces (`income-tax`, `Income Tax`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == wanted)
            .ok_or_else(|| UnknownVariant::new("service category", s.trim()))
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    InProgress,
    NeedsClarification,
    Completed,
}

/// Dashboard grouping of statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBucket {
    Pending,
    Active,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Assigned,
        RequestStatus::InProgress,
        RequestStatus::NeedsClarification,
        RequestStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in-progress",
            Self::NeedsClarification => "needs-clarification",
            Self::Completed => "completed",
        }
    }

    pub fn bucket(&self) -> StatusBucket {
        match self {
            Self::Pending => StatusBucket::Pending,
            Self::Assigned | Self::InProgress | Self::NeedsClarification => StatusBucket::Active,
            Self::Completed => StatusBucket::Completed,
        }
    }

    /// Whether the workflow allows moving from `self` to `next`.
    ///
    /// `Assigned -> Assigned` is a reassignment to another consultant.
    pub fn can_transition_to(
        &self,
        next: RequestStatus,
    ) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Assigned)
                | (Assigned, Assigned)
                | (Assigned, InProgress)
                | (InProgress, NeedsClarification)
                | (NeedsClarification, InProgress)
                | (InProgress, Completed)
        )
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in-progress" => Ok(Self::InProgress),
            "needs-clarification" => Ok(Self::NeedsClarification),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownVariant::new("request status", other)),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot move request from {from} to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },

    #[error("request can only be changed while pending (currently {0})")]
    NotEditable(RequestStatus),
}

/// A customer's request for litigation support.
///
/// `fee` is derived from `key` the same way a package price is. Status and
/// assignee only change through the workflow methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub customer_id: i64,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    key: RateCardKey,
    fee: Decimal,
    status: RequestStatus,
    assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn key(&self) -> RateCardKey {
        self.key
    }

    pub fn fee(&self) -> Decimal {
        self.fee
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn assigned_to(&self) -> Option<i64> {
        self.assigned_to
    }

    /// Hand the request to a consultant (first assignment or reassignment).
    pub fn assign(
        &mut self,
        consultant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.check_transition(RequestStatus::Assigned)?;
        self.assigned_to = Some(consultant_id);
        self.status = RequestStatus::Assigned;
        self.updated_at = now;
        Ok(())
    }

    /// Move to a consultant-driven status.
    pub fn transition(
        &mut self,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if next == RequestStatus::Assigned {
            return Err(WorkflowError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.check_transition(next)?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Apply a customer edit. Only allowed while pending; a new key reprices.
    pub fn edit(
        &mut self,
        edit: ServiceRequestEdit,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if self.status != RequestStatus::Pending {
            return Err(WorkflowError::NotEditable(self.status));
        }
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(category) = edit.category {
            self.category = category;
        }
        if let Some(key) = edit.key {
            self.key = key;
            self.fee = key.fee();
        }
        self.updated_at = now;
        Ok(())
    }

    fn check_transition(
        &self,
        next: RequestStatus,
    ) -> Result<(), WorkflowError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }
}

/// A request as stored by a repository backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequestRecord {
    pub id: i64,
    pub customer_id: i64,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub key: RateCardKey,
    pub stored_fee: Decimal,
    pub status: RequestStatus,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRequestRecord> for ServiceRequest {
    fn from(record: ServiceRequestRecord) -> Self {
        let fee = record.key.fee();
        if fee != record.stored_fee {
            warn!(
                request_id = record.id,
                stored = %record.stored_fee,
                rate_card = %fee,
                "stored request fee disagrees with rate card; repricing"
            );
        }
        Self {
            id: record.id,
            customer_id: record.customer_id,
            title: record.title,
            description: record.description,
            category: record.category,
            key: record.key,
            fee,
            status: record.status,
            assigned_to: record.assigned_to,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// For creating new requests (no id, status or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewServiceRequest {
    pub customer_id: i64,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    key: RateCardKey,
    fee: Decimal,
}

impl NewServiceRequest {
    pub fn new(
        customer_id: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        category: ServiceCategory,
        key: RateCardKey,
    ) -> Self {
        Self {
            customer_id,
            title: title.into(),
            description: description.into(),
            category,
            key,
            fee: key.fee(),
        }
    }

    pub fn key(&self) -> RateCardKey {
        self.key
    }

    pub fn fee(&self) -> Decimal {
        self.fee
    }
}

/// Partial customer edit of a pending request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRequestEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ServiceCategory>,
    pub key: Option<RateCardKey>,
}
