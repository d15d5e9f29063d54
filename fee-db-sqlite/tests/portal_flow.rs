use fee_core::db::{DbConfig, RepositoryRegistry};
use fee_core::models::{EntityType, RequestStatus, ServiceCategory, ServiceType};
use fee_core::portal::{DashboardStats, PackageDraft, Portal, RequestDraft, Session};
use fee_core::{PortalError, RateCardKey};
use fee_db_sqlite::SqliteRepositoryFactory;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

async fn open() -> Box<dyn fee_core::PortalRepository> {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
        .create(&DbConfig::default())
        .await
        .expect("in-memory sqlite should open")
}

#[tokio::test]
async fn request_lifecycle_against_sqlite() {
    let repo = open().await;
    let portal = Portal::new(repo.as_ref());
    let customer = Session::open(repo.as_ref(), "customer@example.com").await.unwrap();
    let consultant = Session::open(repo.as_ref(), "consultant@example.com").await.unwrap();
    let admin = Session::open(repo.as_ref(), "admin@example.com").await.unwrap();

    let request = portal
        .submit_request(
            &customer,
            RequestDraft {
                title: "Transfer pricing adjustment".to_string(),
                description: "TPO order for AY 2022-23".to_string(),
                category: ServiceCategory::InternationalTax,
                key: RateCardKey::new(2, EntityType::Company, ServiceType::Transfer).unwrap(),
            },
        )
        .await
        .unwrap();
    assert_eq!(request.fee(), dec!(50000));

    portal
        .assign_request(&admin, request.id, consultant.user_id())
        .await
        .unwrap();
    portal.accept_request(&consultant, request.id).await.unwrap();
    portal.complete_request(&consultant, request.id).await.unwrap();

    let detail = portal.request_detail(&customer, request.id).await.unwrap();
    assert_eq!(detail.status(), RequestStatus::Completed);

    let stats = portal.dashboard(&admin).await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            total_requests: 1,
            pending_requests: 0,
            active_requests: 0,
            completed_requests: 1,
            active_consultants: 1,
            revenue: dec!(50000),
            unread_messages: 0,
        }
    );
}

#[tokio::test]
async fn seeded_packages_and_admin_edits() {
    let repo = open().await;
    let portal = Portal::new(repo.as_ref());
    let admin = Session::open(repo.as_ref(), "admin@example.com").await.unwrap();
    let customer = Session::open(repo.as_ref(), "customer@example.com").await.unwrap();

    let created = portal
        .create_package(
            &admin,
            PackageDraft {
                name: "Society penalty".to_string(),
                description: String::new(),
                key: RateCardKey::new(4, EntityType::Society, ServiceType::Penalty).unwrap(),
                is_active: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.price(), dec!(1000));

    assert_eq!(portal.list_packages(&admin).await.unwrap().len(), 4);
    assert_eq!(portal.list_packages(&customer).await.unwrap().len(), 3);

    let err = portal.delete_package(&customer, created.id).await.unwrap_err();
    assert!(matches!(err, PortalError::Forbidden(_)));
}

#[tokio::test]
async fn clarification_messages_against_sqlite() {
    let repo = open().await;
    let portal = Portal::new(repo.as_ref());
    let customer = Session::open(repo.as_ref(), "customer@example.com").await.unwrap();
    let consultant = Session::open(repo.as_ref(), "consultant@example.com").await.unwrap();
    let admin = Session::open(repo.as_ref(), "admin@example.com").await.unwrap();
    let draft = || RequestDraft {
        title: "GST demand".to_string(),
        description: String::new(),
        category: ServiceCategory::Gst,
        key: RateCardKey::new(1, EntityType::Huf, ServiceType::Assessment).unwrap(),
    };

    let worked = portal.submit_request(&customer, draft()).await.unwrap().id;
    portal.assign_request(&admin, worked, consultant.user_id()).await.unwrap();
    portal.accept_request(&consultant, worked).await.unwrap();
    portal.request_clarification(&consultant, worked).await.unwrap();
    let question = portal
        .send_message(&consultant, worked, "Please send the DRC-07".to_string())
        .await
        .unwrap();
    assert_eq!(portal.dashboard(&customer).await.unwrap().unread_messages, 1);

    let read = portal.mark_read(&customer, question.id).await.unwrap();
    assert!(read.is_read);
    assert_eq!(portal.unread_count(&customer).await.unwrap(), 0);
    portal.resume_request(&consultant, worked).await.unwrap();

    // Withdrawing a pending request takes its conversation with it.
    let withdrawn = portal.submit_request(&customer, draft()).await.unwrap().id;
    let note = portal
        .send_message(&customer, withdrawn, "Sent by mistake".to_string())
        .await
        .unwrap();
    portal.withdraw_request(&customer, withdrawn).await.unwrap();
    assert!(matches!(
        repo.get_message(note.id).await,
        Err(fee_core::RepositoryError::NotFound)
    ));
}
