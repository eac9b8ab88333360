//! Integration tests for the activity log and the history audit.

use credimo_core::models::activity::CreateActivity;
use credimo_core::models::history::{CreateHistoryEntry, actions};
use credimo_core::models::user::Role;
use credimo_core::repository::{ActivityRepository, HistoryRepository};
use credimo_db::repository::{SurrealActivityRepository, SurrealHistoryRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    credimo_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn activities_are_scoped_to_their_case() {
    let db = setup().await;
    let repo = SurrealActivityRepository::new(db);

    let case_a = Uuid::new_v4();
    let case_b = Uuid::new_v4();
    let author = Uuid::new_v4();

    for (case_id, comment) in [(case_a, "Contactado o cliente"), (case_b, "Outro processo")] {
        repo.append(CreateActivity {
            case_id,
            author_id: author,
            author_name: "Ana Costa".into(),
            author_role: Role::Consultant,
            comment: comment.into(),
        })
        .await
        .unwrap();
    }

    let entries = repo.list_by_case(case_a).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].comment, "Contactado o cliente");
    assert_eq!(entries[0].author_role, Role::Consultant);
}

#[tokio::test]
async fn history_records_field_changes() {
    let db = setup().await;
    let repo = SurrealHistoryRepository::new(db);

    let case_id = Uuid::new_v4();
    let author = Uuid::new_v4();

    repo.append(CreateHistoryEntry {
        case_id,
        author_id: author,
        author_name: "Ana Costa".into(),
        action: actions::CREATED.into(),
        field: None,
        old_value: None,
        new_value: None,
    })
    .await
    .unwrap();

    repo.append(CreateHistoryEntry {
        case_id,
        author_id: author,
        author_name: "Ana Costa".into(),
        action: actions::STATUS_CHANGED.into(),
        field: Some("status".into()),
        old_value: Some("em_espera".into()),
        new_value: Some("documentacao".into()),
    })
    .await
    .unwrap();

    let entries = repo.list_by_case(case_id).await.unwrap();
    assert_eq!(entries.len(), 2);
    // Newest first.
    assert_eq!(entries[0].action, actions::STATUS_CHANGED);
    assert_eq!(entries[0].old_value.as_deref(), Some("em_espera"));
    assert_eq!(entries[1].action, actions::CREATED);
}
