use tracing::info;

use super::{Portal, PortalError, Session, require_text};
use crate::db::PortalRepository;
use crate::models::{Message, NewMessage, ServiceRequest, UserRole};

impl<R: PortalRepository + ?Sized> Portal<'_, R> {
    /// Post to a request's conversation. Anyone who can see the request
    /// may write to it.
    pub async fn send_message(
        &self,
        session: &Session,
        request_id: i64,
        content: String,
    ) -> Result<Message, PortalError> {
        let content = require_text("message", content)?;
        let request = self.request_detail(session, request_id).await?;
        let message = self
            .repo
            .create_message(NewMessage {
                request_id: request.id,
                sender_id: session.user_id(),
                content,
            })
            .await?;
        info!(
            request_id,
            message_id = message.id,
            sender_id = message.sender_id,
            "message sent"
        );
        Ok(message)
    }

    /// The conversation on a request, oldest first.
    pub async fn messages(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<Vec<Message>, PortalError> {
        let request = self.request_detail(session, request_id).await?;
        Ok(self.repo.list_messages(request.id).await?)
    }

    /// Mark one message addressed to the session as read.
    pub async fn mark_read(
        &self,
        session: &Session,
        message_id: i64,
    ) -> Result<Message, PortalError> {
        let mut message = self.repo.get_message(message_id).await?;
        self.request_detail(session, message.request_id).await?;
        if message.sender_id == session.user_id() {
            return Err(PortalError::validation(format!(
                "message {message_id} was sent by {}",
                session.user().email
            )));
        }
        if !message.is_read {
            self.repo.set_message_read(message_id, true).await?;
            message.is_read = true;
        }
        Ok(message)
    }

    /// Mark everything the others wrote on a request as read. Returns how
    /// many messages changed.
    pub async fn mark_all_read(
        &self,
        session: &Session,
        request_id: i64,
    ) -> Result<usize, PortalError> {
        let mut marked = 0;
        for message in self.messages(session, request_id).await? {
            if message.is_unread_for(session.user_id()) {
                self.repo.set_message_read(message.id, true).await?;
                marked += 1;
            }
        }
        Ok(marked)
    }

    /// Sender or admin: remove a message.
    pub async fn delete_message(
        &self,
        session: &Session,
        message_id: i64,
    ) -> Result<(), PortalError> {
        let message = self.repo.get_message(message_id).await?;
        if message.sender_id != session.user_id() && session.role() != UserRole::Admin {
            return Err(PortalError::forbidden(format!(
                "message {message_id} was sent by someone else"
            )));
        }
        self.repo.delete_message(message_id).await?;
        info!(message_id, request_id = message.request_id, "message deleted");
        Ok(())
    }

    /// Unread messages across every request visible to the session.
    pub async fn unread_count(
        &self,
        session: &Session,
    ) -> Result<usize, PortalError> {
        let requests = self.visible_requests(session, None).await?;
        self.unread_in(session, &requests).await
    }

    pub(super) async fn unread_in(
        &self,
        session: &Session,
        requests: &[ServiceRequest],
    ) -> Result<usize, PortalError> {
        let mut unread = 0;
        for request in requests {
            unread += self
                .repo
                .list_messages(request.id)
                .await?
                .iter()
                .filter(|m| m.is_unread_for(session.user_id()))
                .count();
        }
        Ok(unread)
    }
}
