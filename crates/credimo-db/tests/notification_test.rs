//! Integration tests for the notification inbox.

use credimo_core::models::notification::{CreateNotification, NotificationType};
use credimo_core::repository::NotificationRepository;
use credimo_db::repository::SurrealNotificationRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    credimo_db::run_migrations(&db).await.unwrap();
    db
}

fn notify(user_id: Uuid, kind: NotificationType, message: &str) -> CreateNotification {
    CreateNotification {
        user_id,
        case_id: None,
        kind,
        message: message.into(),
    }
}

#[tokio::test]
async fn list_is_recipient_only_by_default() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);

    let alice = Uuid::new_v4();
    let bruno = Uuid::new_v4();

    repo.create(notify(
        alice,
        NotificationType::CaseAssigned,
        "Processo atribuído",
    ))
    .await
    .unwrap();
    repo.create(notify(
        bruno,
        NotificationType::TaskAssigned,
        "Tarefa atribuída",
    ))
    .await
    .unwrap();

    let inbox = repo.list(alice, false, false).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].message, "Processo atribuído");
}

#[tokio::test]
async fn new_case_feed_is_merged_for_privileged_callers() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);

    let admin = Uuid::new_v4();
    let consultant = Uuid::new_v4();

    repo.create(notify(
        consultant,
        NotificationType::NewCase,
        "Novo processo recebido",
    ))
    .await
    .unwrap();
    repo.create(notify(
        consultant,
        NotificationType::DeadlineAssigned,
        "Prazo atribuído",
    ))
    .await
    .unwrap();

    // Without the feed the admin sees nothing.
    assert!(repo.list(admin, false, false).await.unwrap().is_empty());

    // With the feed only the new_case entry is merged in.
    let feed = repo.list(admin, false, true).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].kind, NotificationType::NewCase);
}

#[tokio::test]
async fn mark_read_is_recipient_only_and_idempotent() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);

    let alice = Uuid::new_v4();
    let bruno = Uuid::new_v4();

    let n = repo
        .create(notify(
            alice,
            NotificationType::CaseAssigned,
            "Processo atribuído",
        ))
        .await
        .unwrap();

    // A foreign caller matches zero rows.
    repo.mark_read(n.id, bruno).await.unwrap();
    assert_eq!(repo.list(alice, true, false).await.unwrap().len(), 1);

    repo.mark_read(n.id, alice).await.unwrap();
    repo.mark_read(n.id, alice).await.unwrap();
    assert!(repo.list(alice, true, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_all_read_reports_count() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);

    let alice = Uuid::new_v4();
    for i in 0..3 {
        repo.create(notify(
            alice,
            NotificationType::TaskAssigned,
            &format!("Tarefa {i}"),
        ))
        .await
        .unwrap();
    }

    assert_eq!(repo.mark_all_read(alice).await.unwrap(), 3);
    assert_eq!(repo.mark_all_read(alice).await.unwrap(), 0);
    assert!(repo.list(alice, true, false).await.unwrap().is_empty());
}
