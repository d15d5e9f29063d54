use std::io::Write;

use anyhow::{Context, Result};
use fee_core::db::{InMemoryRepositoryFactory, RepositoryRegistry};
use fee_core::{Portal, PortalRepository, Session};
use fee_db_sqlite::SqliteRepositoryFactory;
use tracing::debug;

use crate::commands::{Commands, dashboard, package, rate_card, request, user};
use crate::config::PortalConfig;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(InMemoryRepositoryFactory));
    registry
}

/// Run one command. Rate-card commands never touch the database.
pub async fn run(
    command: Commands,
    config: &PortalConfig,
    out: &mut dyn Write,
) -> Result<()> {
    if !command.needs_session() {
        return run_offline(command, out);
    }

    let operator = config
        .operator
        .as_deref()
        .context("no user to act as; pass --as <email> or set `operator` in the config file")?;

    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    let repo = build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("failed to open {} database", db_config.backend))?;

    let session = Session::open(repo.as_ref(), operator).await?;
    debug!(user = %session.user().email, role = %session.role(), "session opened");

    execute(command, &Portal::new(repo.as_ref()), &session, out).await
}

/// Run a command that needs a session against an open portal.
pub async fn execute<R: PortalRepository + ?Sized>(
    command: Commands,
    portal: &Portal<'_, R>,
    session: &Session,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Package(args) => package::handle(portal, session, args.action, out).await,
        Commands::Request(args) => request::handle(portal, session, args.action, out).await,
        Commands::User(args) => user::handle(portal, session, args.action, out).await,
        Commands::Dashboard => dashboard::handle(portal, session, out).await,
        offline => run_offline(offline, out),
    }
}

fn run_offline(
    command: Commands,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Slabs => rate_card::slabs(out),
        Commands::Entities => rate_card::entities(out),
        Commands::Services => rate_card::services(out),
        Commands::RateCard { slab, regressions } => rate_card::rate_card(out, slab, regressions),
        Commands::Quote {
            slab,
            entity,
            service,
        } => rate_card::quote(out, slab, &entity, &service),
        Commands::Classify {
            income,
            turnover,
            entity,
            service,
        } => rate_card::classify(out, income, turnover, entity.zip(service)),
        Commands::Package(_) | Commands::Request(_) | Commands::User(_) | Commands::Dashboard => {
            anyhow::bail!("command needs a signed-in user")
        }
    }
}
