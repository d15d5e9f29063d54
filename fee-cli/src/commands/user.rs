use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use fee_core::{Portal, PortalRepository, ServiceCategory, Session, User, UserRole};

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Debug, Subcommand)]
pub enum UserAction {
    List {
        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Onboard a consultant.
    AddConsultant {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Practice area; repeat for several (e.g. `--specialization gst`).
        #[arg(long = "specialization")]
        specializations: Vec<ServiceCategory>,
    },

    SetRole {
        email: String,

        #[arg(long)]
        role: UserRole,
    },

    /// Block a user from signing in. Their requests are kept.
    Deactivate { email: String },
}

pub async fn handle<R: PortalRepository + ?Sized>(
    portal: &Portal<'_, R>,
    session: &Session,
    action: UserAction,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        UserAction::List { role } => {
            for user in portal.list_users(session, role).await? {
                write_user(out, &user)?;
            }
        }

        UserAction::AddConsultant {
            email,
            name,
            specializations,
        } => {
            let user = portal
                .create_consultant(session, &email, &name, specializations)
                .await?;
            writeln!(out, "Created consultant:")?;
            write_user(out, &user)?;
        }

        UserAction::SetRole { email, role } => {
            session.require(UserRole::Admin)?;
            let target = portal.repository().get_user_by_email(&email).await?;
            let user = portal.set_user_role(session, target.id, role).await?;
            write_user(out, &user)?;
        }

        UserAction::Deactivate { email } => {
            session.require(UserRole::Admin)?;
            let target = portal.repository().get_user_by_email(&email).await?;
            let user = portal.deactivate_user(session, target.id).await?;
            write_user(out, &user)?;
        }
    }
    Ok(())
}

fn write_user(
    out: &mut dyn Write,
    user: &User,
) -> Result<()> {
    write!(out, "  #{} {} <{}> {}", user.id, user.name, user.email, user.role)?;
    if !user.specializations.is_empty() {
        let areas: Vec<_> = user.specializations.iter().map(|s| s.as_str()).collect();
        write!(out, " ({})", areas.join(", "))?;
    }
    if !user.is_active {
        write!(out, " [inactive]")?;
    }
    writeln!(out)?;
    Ok(())
}
