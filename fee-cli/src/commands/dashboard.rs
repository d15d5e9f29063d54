use std::io::Write;

use anyhow::Result;
use fee_core::portal::DashboardStats;
use fee_core::{Portal, PortalRepository, Session, UserRole, format_inr};

pub async fn handle<R: PortalRepository + ?Sized>(
    portal: &Portal<'_, R>,
    session: &Session,
    out: &mut dyn Write,
) -> Result<()> {
    let stats = portal.dashboard(session).await?;
    write_stats(out, session, &stats)
}

fn write_stats(
    out: &mut dyn Write,
    session: &Session,
    stats: &DashboardStats,
) -> Result<()> {
    let user = session.user();
    writeln!(out, "Dashboard for {} ({})", user.name, user.role)?;
    writeln!(out, "  requests:     {}", stats.total_requests)?;
    writeln!(out, "    pending:    {}", stats.pending_requests)?;
    writeln!(out, "    active:     {}", stats.active_requests)?;
    writeln!(out, "    completed:  {}", stats.completed_requests)?;
    if session.role() == UserRole::Admin {
        writeln!(out, "  consultants:  {}", stats.active_consultants)?;
    }
    let label = match session.role() {
        UserRole::Customer => "fees paid",
        UserRole::Consultant | UserRole::Admin => "revenue",
    };
    writeln!(out, "  {:<14}{}", format!("{label}:"), format_inr(stats.revenue))?;
    writeln!(out, "  unread:       {}", stats.unread_messages)?;
    Ok(())
}
