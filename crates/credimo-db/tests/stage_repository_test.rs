//! Integration tests for the workflow-stage registry.

use credimo_core::error::CredimoError;
use credimo_core::models::stage::{CreateStage, UpdateStage, canonical_stages};
use credimo_core::repository::StageRepository;
use credimo_db::repository::SurrealStageRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    credimo_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn seed_inserts_canonical_pipeline_once() {
    let db = setup().await;
    let repo = SurrealStageRepository::new(db.clone());

    credimo_db::seed_stages(&db).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 7);

    // Re-running is a no-op.
    credimo_db::seed_stages(&db).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 7);

    let stages = repo.list().await.unwrap();
    let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "em_espera",
            "documentacao",
            "pre_aprovacao",
            "aprovado",
            "escritura",
            "concluido",
            "desistiu",
        ]
    );
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let db = setup().await;
    let repo = SurrealStageRepository::new(db);

    repo.create(CreateStage {
        name: "avaliacao".into(),
        label: "Avaliação".into(),
        order: 1,
        color: None,
        description: None,
        is_default: false,
    })
    .await
    .unwrap();

    let err = repo
        .create(CreateStage {
            name: "avaliacao".into(),
            label: "Outra".into(),
            order: 2,
            color: None,
            description: None,
            is_default: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CredimoError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_and_get_by_name() {
    let db = setup().await;
    let repo = SurrealStageRepository::new(db.clone());
    credimo_db::seed_stages(&db).await.unwrap();

    let stage = repo.get_by_name("documentacao").await.unwrap();
    let updated = repo
        .update(
            stage.id,
            UpdateStage {
                label: Some("Recolha de Documentos".into()),
                color: Some(Some("#FACC15".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.label, "Recolha de Documentos");
    assert_eq!(updated.color.as_deref(), Some("#FACC15"));
    // Name is immutable through update.
    assert_eq!(updated.name, "documentacao");
}

#[tokio::test]
async fn reorder_applies_full_set() {
    let db = setup().await;
    let repo = SurrealStageRepository::new(db.clone());
    credimo_db::seed_stages(&db).await.unwrap();

    let stages = repo.list().await.unwrap();
    assert_eq!(stages.len(), canonical_stages().len());

    // Reverse the pipeline.
    let orders: Vec<_> = stages
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id, (stages.len() - i) as i64))
        .collect();
    repo.reorder(orders).await.unwrap();

    let reordered = repo.list().await.unwrap();
    assert_eq!(reordered.first().unwrap().name, "desistiu");
    assert_eq!(reordered.last().unwrap().name, "em_espera");
}

#[tokio::test]
async fn delete_removes_stage() {
    let db = setup().await;
    let repo = SurrealStageRepository::new(db);

    let stage = repo
        .create(CreateStage {
            name: "temporario".into(),
            label: "Temporário".into(),
            order: 99,
            color: None,
            description: None,
            is_default: false,
        })
        .await
        .unwrap();

    repo.delete(stage.id).await.unwrap();
    let err = repo.get_by_id(stage.id).await.unwrap_err();
    assert!(matches!(err, CredimoError::NotFound { .. }));
}
