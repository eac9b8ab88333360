//! Integration tests for deadlines, tasks and document expiries.

use chrono::NaiveDate;
use credimo_core::models::deadline::{CreateDeadline, Priority, UpdateDeadline};
use credimo_core::models::document::{CreateDocumentExpiry, DocumentType, UpdateDocumentExpiry};
use credimo_core::models::task::{CreateTask, UpdateTask};
use credimo_core::repository::{
    DeadlineRepository, DocumentExpiryRepository, SchedulerScope, TaskRepository,
};
use credimo_db::repository::{
    SurrealDeadlineRepository, SurrealDocumentExpiryRepository, SurrealTaskRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    credimo_db::run_migrations(&db).await.unwrap();
    db
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn deadline_on(due: NaiveDate, created_by: Uuid) -> CreateDeadline {
    CreateDeadline {
        case_id: None,
        title: "Entrega de documentos".into(),
        description: None,
        due_date: due,
        priority: Priority::Medium,
        created_by,
        assigned_consultant_id: None,
        assigned_intermediary_id: None,
    }
}

#[tokio::test]
async fn deadline_round_trip_and_completion() {
    let db = setup().await;
    let repo = SurrealDeadlineRepository::new(db);
    let author = Uuid::new_v4();

    let deadline = repo
        .create(deadline_on(date(2026, 9, 15), author))
        .await
        .unwrap();
    assert!(!deadline.completed);
    assert_eq!(deadline.due_date, date(2026, 9, 15));

    let done = repo
        .update(
            deadline.id,
            UpdateDeadline {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(done.completed);

    assert_eq!(
        repo.count_pending(&SchedulerScope::All).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn deadline_list_respects_date_window_and_order() {
    let db = setup().await;
    let repo = SurrealDeadlineRepository::new(db);
    let author = Uuid::new_v4();

    for day in [20, 5, 12] {
        repo.create(deadline_on(date(2026, 9, day), author))
            .await
            .unwrap();
    }
    repo.create(deadline_on(date(2026, 10, 1), author))
        .await
        .unwrap();

    let september = repo
        .list(
            &SchedulerScope::All,
            Some(date(2026, 9, 1)),
            Some(date(2026, 9, 30)),
        )
        .await
        .unwrap();
    assert_eq!(september.len(), 3);
    let dues: Vec<_> = september.iter().map(|d| d.due_date).collect();
    assert_eq!(
        dues,
        vec![date(2026, 9, 5), date(2026, 9, 12), date(2026, 9, 20)]
    );
}

#[tokio::test]
async fn visible_scope_unions_creator_assignee_and_cases() {
    let db = setup().await;
    let repo = SurrealDeadlineRepository::new(db);

    let me = Uuid::new_v4();
    let someone = Uuid::new_v4();
    let my_case = Uuid::new_v4();

    // Mine by creation.
    repo.create(deadline_on(date(2026, 9, 1), me)).await.unwrap();
    // Mine by assignment.
    repo.create(CreateDeadline {
        assigned_consultant_id: Some(me),
        ..deadline_on(date(2026, 9, 2), someone)
    })
    .await
    .unwrap();
    // Mine through a visible case.
    repo.create(CreateDeadline {
        case_id: Some(my_case),
        ..deadline_on(date(2026, 9, 3), someone)
    })
    .await
    .unwrap();
    // Not mine at all.
    repo.create(deadline_on(date(2026, 9, 4), someone))
        .await
        .unwrap();

    let visible = repo
        .list(
            &SchedulerScope::Visible {
                user_id: me,
                case_ids: vec![my_case],
            },
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(visible.len(), 3);
}

#[tokio::test]
async fn assignment_scope_matches_either_binding() {
    let db = setup().await;
    let repo = SurrealDeadlineRepository::new(db);

    let consultant = Uuid::new_v4();
    let intermediary = Uuid::new_v4();
    let author = Uuid::new_v4();

    repo.create(CreateDeadline {
        assigned_consultant_id: Some(consultant),
        ..deadline_on(date(2026, 9, 1), author)
    })
    .await
    .unwrap();
    repo.create(CreateDeadline {
        assigned_intermediary_id: Some(intermediary),
        ..deadline_on(date(2026, 9, 2), author)
    })
    .await
    .unwrap();
    repo.create(deadline_on(date(2026, 9, 3), author))
        .await
        .unwrap();

    let both = repo
        .list(
            &SchedulerScope::Assignment {
                consultant_id: Some(consultant),
                intermediary_id: Some(intermediary),
                case_ids: vec![],
            },
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(both.len(), 2);

    let consultant_only = repo
        .list(
            &SchedulerScope::Assignment {
                consultant_id: Some(consultant),
                intermediary_id: None,
                case_ids: vec![],
            },
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(consultant_only.len(), 1);
}

#[tokio::test]
async fn task_crud_with_optional_due_date() {
    let db = setup().await;
    let repo = SurrealTaskRepository::new(db);
    let author = Uuid::new_v4();

    let task = repo
        .create(CreateTask {
            case_id: None,
            title: "Ligar ao banco".into(),
            description: None,
            due_date: None,
            priority: Priority::High,
            created_by: author,
            assigned_to: None,
        })
        .await
        .unwrap();
    assert!(task.due_date.is_none());

    let updated = repo
        .update(
            task.id,
            UpdateTask {
                due_date: Some(Some(date(2026, 9, 10))),
                assigned_to: Some(Some(author)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.due_date, Some(date(2026, 9, 10)));
    assert_eq!(updated.assigned_to, Some(author));

    assert_eq!(repo.count_pending(&SchedulerScope::All).await.unwrap(), 1);

    repo.delete(task.id).await.unwrap();
    assert_eq!(repo.count_pending(&SchedulerScope::All).await.unwrap(), 0);
}

#[tokio::test]
async fn document_expiry_upcoming_window() {
    let db = setup().await;
    let repo = SurrealDocumentExpiryRepository::new(db);

    let case_a = Uuid::new_v4();
    let case_b = Uuid::new_v4();
    let author = Uuid::new_v4();

    let doc = |case_id, name: &str, expiry| CreateDocumentExpiry {
        case_id,
        document_type: DocumentType::Cc,
        document_name: name.into(),
        expiry_date: expiry,
        notes: None,
        created_by: author,
    };

    repo.create(doc(case_a, "CC João", date(2026, 9, 10)))
        .await
        .unwrap();
    repo.create(doc(case_b, "CC Maria", date(2026, 9, 20)))
        .await
        .unwrap();
    repo.create(doc(case_a, "IRS 2025", date(2026, 12, 1)))
        .await
        .unwrap();

    let window = repo
        .upcoming(date(2026, 9, 1), date(2026, 9, 30), None)
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].document_name, "CC João");

    // Row-restricted to one case.
    let restricted = repo
        .upcoming(date(2026, 9, 1), date(2026, 9, 30), Some(vec![case_a]))
        .await
        .unwrap();
    assert_eq!(restricted.len(), 1);

    let by_case = repo.list_by_case(case_a).await.unwrap();
    assert_eq!(by_case.len(), 2);
}

#[tokio::test]
async fn document_expiry_update() {
    let db = setup().await;
    let repo = SurrealDocumentExpiryRepository::new(db);

    let doc = repo
        .create(CreateDocumentExpiry {
            case_id: Uuid::new_v4(),
            document_type: DocumentType::Passaporte,
            document_name: "Passaporte".into(),
            expiry_date: date(2027, 1, 1),
            notes: None,
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            doc.id,
            UpdateDocumentExpiry {
                expiry_date: Some(date(2027, 6, 1)),
                notes: Some(Some("renovado".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.expiry_date, date(2027, 6, 1));
    assert_eq!(updated.notes.as_deref(), Some("renovado"));
}
