//! Command-line definition for the `portal` binary.

pub mod dashboard;
pub mod package;
pub mod rate_card;
pub mod request;
pub mod user;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fee_core::{EntityType, RateCardError, RateCardKey, ServiceType, SlabId};
use rust_decimal::Decimal;

use crate::config::Overrides;

/// Rate card and service desk for tax-dispute work.
///
/// Rate-card commands work offline. Everything else opens the configured
/// database and acts as the user named by `--as` (or `operator` in the
/// config file).
#[derive(Debug, Parser)]
#[command(name = "portal", version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `portal.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Email of the user to act as.
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    pub operator: Option<String>,

    /// Log filter, e.g. `debug` or `fee_core=trace`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
            operator: self.operator.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the income slabs.
    Slabs,

    /// List the entity types.
    Entities,

    /// List the service types.
    Services,

    /// Print the rate card.
    RateCard {
        /// Only this slab.
        #[arg(long, allow_negative_numbers = true)]
        slab: Option<i64>,

        /// Report cells priced below the slab beneath them.
        #[arg(long)]
        regressions: bool,
    },

    /// Look up the fee for one slab, entity and service.
    Quote {
        #[arg(allow_negative_numbers = true)]
        slab: i64,
        entity: String,
        service: String,
    },

    /// Place a client in a slab from gross income and turnover (in lakhs).
    Classify {
        #[arg(long)]
        income: Decimal,

        #[arg(long, default_value = "0")]
        turnover: Decimal,

        /// Also quote this entity type in the resulting slab.
        #[arg(long, requires = "service")]
        entity: Option<EntityType>,

        /// Also quote this service type in the resulting slab.
        #[arg(long, requires = "entity")]
        service: Option<ServiceType>,
    },

    /// Manage service packages.
    Package(package::PackageArgs),

    /// Submit and work service requests.
    Request(request::RequestArgs),

    /// Manage users (admin).
    User(user::UserArgs),

    /// Show request and revenue totals for the current user.
    Dashboard,
}

impl Commands {
    /// Whether the command needs a repository and a signed-in user.
    pub fn needs_session(&self) -> bool {
        matches!(
            self,
            Self::Package(_) | Self::Request(_) | Self::User(_) | Self::Dashboard
        )
    }
}

/// A rate-card cell given on the command line.
#[derive(Debug, Clone, Args)]
pub struct KeyArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub slab: i64,

    #[arg(long)]
    pub entity: EntityType,

    #[arg(long)]
    pub service: ServiceType,
}

impl KeyArgs {
    pub fn key(&self) -> Result<RateCardKey, RateCardError> {
        Ok(RateCardKey {
            slab: SlabId::try_from(self.slab)?,
            entity_type: self.entity,
            service_type: self.service,
        })
    }
}

/// A partial rate-card cell; unset parts keep their current value.
#[derive(Debug, Clone, Default, Args)]
pub struct KeyUpdateArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub slab: Option<i64>,

    #[arg(long)]
    pub entity: Option<EntityType>,

    #[arg(long)]
    pub service: Option<ServiceType>,
}

impl KeyUpdateArgs {
    pub fn is_empty(&self) -> bool {
        self.slab.is_none() && self.entity.is_none() && self.service.is_none()
    }

    /// `None` when nothing was given.
    pub fn merge(
        &self,
        current: RateCardKey,
    ) -> Result<Option<RateCardKey>, RateCardError> {
        if self.is_empty() {
            return Ok(None);
        }
        let slab = match self.slab {
            Some(slab) => SlabId::try_from(slab)?,
            None => current.slab,
        };
        Ok(Some(RateCardKey {
            slab,
            entity_type: self.entity.unwrap_or(current.entity_type),
            service_type: self.service.unwrap_or(current.service_type),
        }))
    }
}
