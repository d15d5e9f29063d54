use chrono::Utc;
use tracing::info;

use super::{Portal, PortalError, Session, require_text};
use crate::db::{PortalRepository, RequestFilter};
use crate::models::{
    NewServiceRequest, RequestStatus, ServiceCategory, ServiceRequest, ServiceRequestEdit,
    UserRole, WorkflowError,
};
use crate::rate_card::RateCardKey;

/// What a customer fills in when submitting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub key: RateCardKey,
}

impl<R: PortalRepository + ?Sized> Portal<'_, R> {
    /// Customer: open a new request, priced from the rate card.
    pub async fn submit_request(
        &self,
        session: &Session,
        draft: RequestDraft,
    ) -> Result<ServiceRequest, PortalError> {
        session.require(UserRole::Customer)?;
        let title = require_text("title", draft.title)?;
        let request = self
            .repo
            .create_request(NewServiceRequest::new(
                session.user_id(),
                title,
                draft.description.trim(),
                draft.category,
                draft.key,
            ))
            .await?;
        info!(
            request_id = request.id,
            customer_id = request.customer_id,
            key = %request.key(),
            fee = %request.fee(),
            "request submitted"
        );
        Ok(request)
    }

    /// Customer: edit one of their own requests while it is still pending.
    pub async fn update_request(
        &self,
        session: &Session,
        request_id: i64,
        mut edit: ServiceRequestEdit,
    ) -> Result<ServiceRequest, PortalError> {
        session.require(UserRole::Customer)?;
        let mut request = self.owned_request(session, request_id).await?;
        if let Some(title) = edit.title.take() {
            edit.title = Some(require_text("title", title)?);
        }
        request.edit(edit, Utc::now())?;
        self.repo.update_request(&request).await?;
        info!(request_id, fee = %request.fee(), "request updated");
        Ok(request)
    }

    /// Customer: delete one of their own requests while it is still pending.
    pub async fn withdraw_request(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<(), PortalError> {
        session.require(UserRole::Customer)?;
        let request = self.owned_request(session, request_id).await?;
        if request.status() != RequestStatus::Pending {
            return Err(WorkflowError::NotEditable(request.status()).into());
        }
        self.repo.delete_request(request_id).await?;
        info!(request_id, "request withdrawn");
        Ok(())
    }

    /// Customer: their own requests, optionally narrowed to one status.
    pub async fn my_requests(
        &self,
        session: &Session,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ServiceRequest>, PortalError> {
        session.require(UserRole::Customer)?;
        Ok(self
            .repo
            .list_requests(RequestFilter::for_customer(session.user_id()).with_status(status))
            .await?)
    }

    /// Admin: hand a pending (or reassign an assigned) request to an
    /// active consultant.
    pub async fn assign_request(
        &self,
        session: &Session,
        request_id: i64,
        consultant_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        session.require(UserRole::Admin)?;
        let consultant = self.repo.get_user(consultant_id).await?;
        if consultant.role != UserRole::Consultant {
            return Err(PortalError::validation(format!(
                "{} is a {}, not a consultant",
                consultant.email, consultant.role
            )));
        }
        if !consultant.is_active {
            return Err(PortalError::InactiveUser(consultant.email));
        }

        let mut request = self.repo.get_request(request_id).await?;
        request.assign(consultant_id, Utc::now())?;
        self.repo.update_request(&request).await?;
        info!(request_id, consultant_id, "request assigned");
        Ok(request)
    }

    /// Assigned consultant: start work on the request.
    pub async fn accept_request(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        self.advance(
            session,
            request_id,
            RequestStatus::Assigned,
            RequestStatus::InProgress,
        )
        .await
    }

    /// Assigned consultant: pause work pending information from the customer.
    pub async fn request_clarification(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        self.advance(
            session,
            request_id,
            RequestStatus::InProgress,
            RequestStatus::NeedsClarification,
        )
        .await
    }

    /// Assigned consultant: pick work back up after a clarification.
    pub async fn resume_request(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        self.advance(
            session,
            request_id,
            RequestStatus::NeedsClarification,
            RequestStatus::InProgress,
        )
        .await
    }

    /// Assigned consultant: close the request. Its fee counts as revenue.
    pub async fn complete_request(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        self.advance(
            session,
            request_id,
            RequestStatus::InProgress,
            RequestStatus::Completed,
        )
        .await
    }

    /// Requests the session may see: a customer's own, a consultant's
    /// assigned, or all of them for an admin.
    pub async fn visible_requests(
        &self,
        session: &Session,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ServiceRequest>, PortalError> {
        let filter = match session.role() {
            UserRole::Customer => RequestFilter::for_customer(session.user_id()),
            UserRole::Consultant => RequestFilter::for_consultant(session.user_id()),
            UserRole::Admin => RequestFilter::default(),
        };
        Ok(self.repo.list_requests(filter.with_status(status)).await?)
    }

    /// A single request, subject to the same visibility as
    /// [`Portal::visible_requests`].
    pub async fn request_detail(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        let request = self.repo.get_request(request_id).await?;
        let visible = match session.role() {
            UserRole::Customer => request.customer_id == session.user_id(),
            UserRole::Consultant => request.assigned_to() == Some(session.user_id()),
            UserRole::Admin => true,
        };
        if !visible {
            return Err(PortalError::forbidden(format!(
                "request {request_id} is not visible to {}",
                session.user().email
            )));
        }
        Ok(request)
    }

    async fn owned_request(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<ServiceRequest, PortalError> {
        let request = self.repo.get_request(request_id).await?;
        if request.customer_id != session.user_id() {
            return Err(PortalError::forbidden(format!(
                "request {request_id} belongs to another customer"
            )));
        }
        Ok(request)
    }

    async fn advance(
        &self,
        session: &Session,
        request_id: i64,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<ServiceRequest, PortalError> {
        session.require(UserRole::Consultant)?;
        let mut request = self.repo.get_request(request_id).await?;
        if request.assigned_to() != Some(session.user_id()) {
            return Err(PortalError::forbidden(format!(
                "request {request_id} is not assigned to {}",
                session.user().email
            )));
        }
        let from = request.status();
        // Each consultant action owns exactly one edge of the workflow.
        if from != expected {
            return Err(WorkflowError::InvalidTransition { from, to: next }.into());
        }
        request.transition(next, Utc::now())?;
        self.repo.update_request(&request).await?;
        info!(request_id, %from, to = %next, "request status changed");
        Ok(request)
    }
}
