use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use fee_core::portal::PackageDraft;
use fee_core::{Portal, PortalRepository, ServicePackage, ServicePackageUpdate, Session, format_inr};

use super::{KeyArgs, KeyUpdateArgs};

#[derive(Debug, Args)]
pub struct PackageArgs {
    #[command(subcommand)]
    pub action: PackageAction,
}

#[derive(Debug, Subcommand)]
pub enum PackageAction {
    /// Create a package priced from the rate card.
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[command(flatten)]
        key: KeyArgs,

        /// Create the package hidden from customers.
        #[arg(long)]
        inactive: bool,
    },

    /// Edit a package; the price follows the new cell.
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        key: KeyUpdateArgs,
    },

    /// Offer a package to customers.
    Activate { id: i64 },

    /// Hide a package from customers.
    Deactivate { id: i64 },

    Delete { id: i64 },

    /// List packages (customers and consultants see active ones only).
    List,
}

pub async fn handle<R: PortalRepository + ?Sized>(
    portal: &Portal<'_, R>,
    session: &Session,
    action: PackageAction,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        PackageAction::Create {
            name,
            description,
            key,
            inactive,
        } => {
            let package = portal
                .create_package(
                    session,
                    PackageDraft {
                        name,
                        description,
                        key: key.key()?,
                        is_active: !inactive,
                    },
                )
                .await?;
            writeln!(out, "Created package:")?;
            write_package(out, &package)?;
        }

        PackageAction::Update {
            id,
            name,
            description,
            key,
        } => {
            let key = if key.is_empty() {
                None
            } else {
                let current = portal.repository().get_package(id).await?;
                key.merge(current.key())?
            };
            let update = ServicePackageUpdate {
                name,
                description,
                key,
                is_active: None,
            };
            let package = portal.update_package(session, id, update).await?;
            writeln!(out, "Updated package:")?;
            write_package(out, &package)?;
        }

        PackageAction::Activate { id } => {
            let package = portal.set_package_active(session, id, true).await?;
            write_package(out, &package)?;
        }

        PackageAction::Deactivate { id } => {
            let package = portal.set_package_active(session, id, false).await?;
            write_package(out, &package)?;
        }

        PackageAction::Delete { id } => {
            portal.delete_package(session, id).await?;
            writeln!(out, "Deleted package #{id}")?;
        }

        PackageAction::List => {
            let packages = portal.list_packages(session).await?;
            if packages.is_empty() {
                writeln!(out, "No packages found")?;
            }
            for package in &packages {
                write_package(out, package)?;
            }
        }
    }
    Ok(())
}

fn write_package(
    out: &mut dyn Write,
    package: &ServicePackage,
) -> Result<()> {
    writeln!(
        out,
        "  #{} {} ({}) {}{}",
        package.id,
        package.name,
        package.key(),
        format_inr(package.price()),
        if package.is_active { "" } else { " [inactive]" }
    )?;
    Ok(())
}
