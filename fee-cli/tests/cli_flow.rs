//! Drives the `portal` commands end to end against a seeded in-memory
//! SQLite database.

use clap::Parser;
use fee_cli::app::{self, build_registry};
use fee_cli::commands::Cli;
use fee_core::db::DbConfig;
use fee_core::{Portal, PortalError, PortalRepository, Session};
use pretty_assertions::assert_eq;

const CUSTOMER: &str = "customer@example.com";
const CONSULTANT: &str = "consultant@example.com";
const ADMIN: &str = "admin@example.com";

async fn open_repo() -> Box<dyn PortalRepository> {
    build_registry()
        .create(&DbConfig::default())
        .await
        .expect("in-memory sqlite should open")
}

/// Parse `args` as a `portal` command line and run it as `email`.
async fn run_as(
    repo: &dyn PortalRepository,
    email: &str,
    args: &[&str],
) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("portal").chain(args.iter().copied()))?;
    let session = Session::open(repo, email).await?;
    let mut out = Vec::new();
    app::execute(cli.command, &Portal::new(repo), &session, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn request_lifecycle() {
    let repo = open_repo().await;
    let repo = repo.as_ref();

    let submitted = run_as(
        repo,
        CUSTOMER,
        &[
            "request", "submit", "--title", "Scrutiny notice", "--category", "income-tax",
            "--slab", "3", "--entity", "individual", "--service", "assessment",
        ],
    )
    .await
    .unwrap();
    assert_eq!(
        submitted,
        "Submitted request:\n  #1 [pending] Scrutiny notice (slab 3 / individual / assessment) ₹10,000\n"
    );

    let assigned = run_as(
        repo,
        ADMIN,
        &["request", "assign", "1", "--consultant", CONSULTANT],
    )
    .await
    .unwrap();
    assert!(assigned.starts_with("Assigned to consultant@example.com:\n  #1 [assigned]"));

    for step in ["accept", "clarify", "resume"] {
        run_as(repo, CONSULTANT, &["request", step, "1"]).await.unwrap();
    }
    let completed = run_as(repo, CONSULTANT, &["request", "complete", "1"]).await.unwrap();
    assert!(completed.contains("[completed]"));

    let detail = run_as(repo, CUSTOMER, &["request", "show", "1"]).await.unwrap();
    assert!(detail.contains("  status:      completed\n"));
    assert!(detail.contains("  consultant:  consultant@example.com\n"));

    let dashboard = run_as(repo, ADMIN, &["dashboard"]).await.unwrap();
    assert!(dashboard.contains("    completed:  1\n"));
    assert!(dashboard.contains("  revenue:      ₹10,000\n"));
}

#[tokio::test]
async fn workflow_errors_surface() {
    let repo = open_repo().await;
    let repo = repo.as_ref();
    run_as(
        repo,
        CUSTOMER,
        &[
            "request", "submit", "--title", "GST notice", "--category", "gst", "--slab", "1",
            "--entity", "huf", "--service", "notices",
        ],
    )
    .await
    .unwrap();

    // Not assigned yet, so the consultant cannot start it.
    let err = run_as(repo, CONSULTANT, &["request", "accept", "1"])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PortalError>(),
        Some(PortalError::Forbidden(_))
    ));

    let err = run_as(repo, CUSTOMER, &["request", "assign", "1", "--consultant", CONSULTANT])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PortalError>(),
        Some(PortalError::Forbidden(_))
    ));

    let withdrawn = run_as(repo, CUSTOMER, &["request", "withdraw", "1"]).await.unwrap();
    assert_eq!(withdrawn, "Withdrew request #1\n");
    let listed = run_as(repo, CUSTOMER, &["request", "list"]).await.unwrap();
    assert_eq!(listed, "No requests found\n");
}

#[tokio::test]
async fn package_admin() {
    let repo = open_repo().await;
    let repo = repo.as_ref();

    let listed = run_as(repo, CUSTOMER, &["package", "list"]).await.unwrap();
    assert_eq!(listed.lines().count(), 3);

    let updated = run_as(repo, ADMIN, &["package", "update", "1", "--slab", "5"])
        .await
        .unwrap();
    assert!(updated.contains("(slab 5 / individual / notices) ₹10,000"), "{updated}");

    let hidden = run_as(repo, ADMIN, &["package", "deactivate", "1"]).await.unwrap();
    assert!(hidden.ends_with("[inactive]\n"));
    let listed = run_as(repo, CUSTOMER, &["package", "list"]).await.unwrap();
    assert_eq!(listed.lines().count(), 2);

    let err = run_as(repo, CUSTOMER, &["package", "delete", "2"])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PortalError>(),
        Some(PortalError::Forbidden(_))
    ));

    let err = run_as(repo, ADMIN, &["package", "update", "2", "--slab", "6"])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid income slab: '6'");
}

#[tokio::test]
async fn user_admin() {
    let repo = open_repo().await;
    let repo = repo.as_ref();

    let created = run_as(
        repo,
        ADMIN,
        &[
            "user", "add-consultant", "--email", "New@Example.com", "--name", "Ravi Kumar",
            "--specialization", "gst", "--specialization", "corporate-tax",
        ],
    )
    .await
    .unwrap();
    assert_eq!(
        created,
        "Created consultant:\n  #4 Ravi Kumar <new@example.com> consultant (GST, Corporate Tax)\n"
    );

    let consultants = run_as(repo, ADMIN, &["user", "list", "--role", "consultant"])
        .await
        .unwrap();
    assert_eq!(consultants.lines().count(), 2);

    let deactivated = run_as(repo, ADMIN, &["user", "deactivate", "new@example.com"])
        .await
        .unwrap();
    assert!(deactivated.ends_with("[inactive]\n"));
    let err = run_as(repo, "new@example.com", &["dashboard"]).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PortalError>(),
        Some(PortalError::InactiveUser(_))
    ));

    let err = run_as(repo, ADMIN, &["user", "set-role", ADMIN, "--role", "customer"])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PortalError>(),
        Some(PortalError::Forbidden(_))
    ));
}

#[tokio::test]
async fn clarification_conversation() {
    let repo = open_repo().await;
    let repo = repo.as_ref();
    run_as(
        repo,
        CUSTOMER,
        &[
            "request", "submit", "--title", "Penalty order", "--category", "income-tax",
            "--slab", "2", "--entity", "individual", "--service", "penalty",
        ],
    )
    .await
    .unwrap();
    run_as(repo, ADMIN, &["request", "assign", "1", "--consultant", CONSULTANT])
        .await
        .unwrap();
    for step in ["accept", "clarify"] {
        run_as(repo, CONSULTANT, &["request", step, "1"]).await.unwrap();
    }

    let sent = run_as(
        repo,
        CONSULTANT,
        &["request", "message", "1", "--text", "Which assessment year?"],
    )
    .await
    .unwrap();
    assert_eq!(sent, "Sent message #1 on request #1\n");

    let dashboard = run_as(repo, CUSTOMER, &["dashboard"]).await.unwrap();
    assert!(dashboard.ends_with("  unread:       1\n"), "{dashboard}");

    let thread = run_as(repo, CUSTOMER, &["request", "messages", "1"]).await.unwrap();
    assert!(
        thread.ends_with(" consultant@example.com [new]: Which assessment year?\n"),
        "{thread}"
    );
    let thread = run_as(repo, CUSTOMER, &["request", "messages", "1"]).await.unwrap();
    assert!(!thread.contains("[new]"), "{thread}");

    let err = run_as(repo, CUSTOMER, &["request", "delete-message", "1"])
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PortalError>(),
        Some(PortalError::Forbidden(_))
    ));
}
