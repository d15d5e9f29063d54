use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use fee_core::portal::RequestDraft;
use fee_core::{
    Message, Portal, PortalRepository, RequestStatus, ServiceCategory, ServiceRequest,
    ServiceRequestEdit, Session, UserRole, format_inr,
};

use super::{KeyArgs, KeyUpdateArgs};

#[derive(Debug, Args)]
pub struct RequestArgs {
    #[command(subcommand)]
    pub action: RequestAction,
}

#[derive(Debug, Subcommand)]
pub enum RequestAction {
    /// Open a new request (customer).
    Submit {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// e.g. `income-tax`, `gst`, `international-tax`.
        #[arg(long)]
        category: ServiceCategory,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Edit a pending request (customer).
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<ServiceCategory>,

        #[command(flatten)]
        key: KeyUpdateArgs,
    },

    /// Requests visible to the current user.
    List {
        #[arg(long)]
        status: Option<RequestStatus>,
    },

    Show { id: i64 },

    /// Hand a request to a consultant (admin).
    Assign {
        id: i64,

        /// Consultant's email.
        #[arg(long)]
        consultant: String,
    },

    /// Start work on an assigned request (consultant).
    Accept { id: i64 },

    /// Ask the customer for more information (consultant).
    Clarify { id: i64 },

    /// Continue after a clarification (consultant).
    Resume { id: i64 },

    /// Close a request (consultant).
    Complete { id: i64 },

    /// Delete a pending request (customer).
    Withdraw { id: i64 },

    /// Write to a request's conversation.
    Message {
        id: i64,

        #[arg(long)]
        text: String,
    },

    /// Show a request's conversation and mark it read.
    Messages { id: i64 },

    /// Remove a message (its sender or an admin).
    DeleteMessage { message_id: i64 },
}

pub async fn handle<R: PortalRepository + ?Sized>(
    portal: &Portal<'_, R>,
    session: &Session,
    action: RequestAction,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        RequestAction::Submit {
            title,
            description,
            category,
            key,
        } => {
            let request = portal
                .submit_request(
                    session,
                    RequestDraft {
                        title,
                        description,
                        category,
                        key: key.key()?,
                    },
                )
                .await?;
            writeln!(out, "Submitted request:")?;
            write_summary(out, &request)?;
        }

        RequestAction::Update {
            id,
            title,
            description,
            category,
            key,
        } => {
            let key = if key.is_empty() {
                None
            } else {
                let current = portal.request_detail(session, id).await?;
                key.merge(current.key())?
            };
            let edit = ServiceRequestEdit {
                title,
                description,
                category,
                key,
            };
            let request = portal.update_request(session, id, edit).await?;
            writeln!(out, "Updated request:")?;
            write_summary(out, &request)?;
        }

        RequestAction::List { status } => {
            let requests = portal.visible_requests(session, status).await?;
            if requests.is_empty() {
                writeln!(out, "No requests found")?;
            }
            for request in &requests {
                write_summary(out, request)?;
            }
        }

        RequestAction::Show { id } => {
            let request = portal.request_detail(session, id).await?;
            write_detail(portal, out, &request).await?;
        }

        RequestAction::Assign { id, consultant } => {
            session.require(UserRole::Admin)?;
            let consultant = portal.repository().get_user_by_email(&consultant).await?;
            let request = portal.assign_request(session, id, consultant.id).await?;
            writeln!(out, "Assigned to {}:", consultant.email)?;
            write_summary(out, &request)?;
        }

        RequestAction::Accept { id } => {
            write_summary(out, &portal.accept_request(session, id).await?)?;
        }

        RequestAction::Clarify { id } => {
            write_summary(out, &portal.request_clarification(session, id).await?)?;
        }

        RequestAction::Resume { id } => {
            write_summary(out, &portal.resume_request(session, id).await?)?;
        }

        RequestAction::Complete { id } => {
            write_summary(out, &portal.complete_request(session, id).await?)?;
        }

        RequestAction::Withdraw { id } => {
            portal.withdraw_request(session, id).await?;
            writeln!(out, "Withdrew request #{id}")?;
        }

        RequestAction::Message { id, text } => {
            let message = portal.send_message(session, id, text).await?;
            writeln!(out, "Sent message #{} on request #{id}", message.id)?;
        }

        RequestAction::Messages { id } => {
            let messages = portal.messages(session, id).await?;
            if messages.is_empty() {
                writeln!(out, "No messages on request #{id}")?;
            } else {
                write_messages(portal, out, session, &messages).await?;
                portal.mark_all_read(session, id).await?;
            }
        }

        RequestAction::DeleteMessage { message_id } => {
            portal.delete_message(session, message_id).await?;
            writeln!(out, "Deleted message #{message_id}")?;
        }
    }
    Ok(())
}

fn write_summary(
    out: &mut dyn Write,
    request: &ServiceRequest,
) -> Result<()> {
    writeln!(
        out,
        "  #{} [{}] {} ({}) {}",
        request.id,
        request.status(),
        request.title,
        request.key(),
        format_inr(request.fee())
    )?;
    Ok(())
}

async fn write_detail<R: PortalRepository + ?Sized>(
    portal: &Portal<'_, R>,
    out: &mut dyn Write,
    request: &ServiceRequest,
) -> Result<()> {
    let customer = portal.repository().get_user(request.customer_id).await?;
    let consultant = match request.assigned_to() {
        Some(id) => portal.repository().get_user(id).await?.email,
        None => "unassigned".to_string(),
    };

    writeln!(out, "Request #{}: {}", request.id, request.title)?;
    writeln!(out, "  status:      {}", request.status())?;
    writeln!(out, "  category:    {}", request.category)?;
    writeln!(out, "  rate card:   {}", request.key())?;
    writeln!(out, "  fee:         {}", format_inr(request.fee()))?;
    writeln!(out, "  customer:    {}", customer.email)?;
    writeln!(out, "  consultant:  {consultant}")?;
    writeln!(out, "  submitted:   {}", request.created_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out, "  updated:     {}", request.updated_at.format("%Y-%m-%d %H:%M UTC"))?;
    if !request.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", request.description)?;
    }
    Ok(())
}

/// Unread messages from others are flagged `[new]`.
async fn write_messages<R: PortalRepository + ?Sized>(
    portal: &Portal<'_, R>,
    out: &mut dyn Write,
    session: &Session,
    messages: &[Message],
) -> Result<()> {
    let mut senders: HashMap<i64, String> = HashMap::new();
    for message in messages {
        if !senders.contains_key(&message.sender_id) {
            let sender = portal.repository().get_user(message.sender_id).await?;
            senders.insert(sender.id, sender.email);
        }
        let sender = senders
            .get(&message.sender_id)
            .map(String::as_str)
            .unwrap_or_default();
        let flag = if message.is_unread_for(session.user_id()) { " [new]" } else { "" };
        writeln!(
            out,
            "  #{} {} {}{}: {}",
            message.id,
            message.created_at.format("%Y-%m-%d %H:%M"),
            sender,
            flag,
            message.content
        )?;
    }
    Ok(())
}
