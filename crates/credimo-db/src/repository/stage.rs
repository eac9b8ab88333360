//! SurrealDB implementation of [`StageRepository`].

use chrono::{DateTime, Utc};
use credimo_core::error::{CredimoError, CredimoResult};
use credimo_core::models::stage::{CreateStage, UpdateStage, WorkflowStage};
use credimo_core::repository::StageRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, parse_uuid};

#[derive(Debug, SurrealValue)]
struct StageRow {
    name: String,
    label: String,
    order: i64,
    color: Option<String>,
    description: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct StageRowWithId {
    record_id: String,
    name: String,
    label: String,
    order: i64,
    color: Option<String>,
    description: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl StageRow {
    fn into_stage(self, id: Uuid) -> WorkflowStage {
        WorkflowStage {
            id,
            name: self.name,
            label: self.label,
            order: self.order,
            color: self.color,
            description: self.description,
            is_default: self.is_default,
            created_at: self.created_at,
        }
    }
}

impl StageRowWithId {
    fn try_into_stage(self) -> Result<WorkflowStage, DbError> {
        let id = parse_uuid("workflow_status", &self.record_id)?;
        Ok(WorkflowStage {
            id,
            name: self.name,
            label: self.label,
            order: self.order,
            color: self.color,
            description: self.description,
            is_default: self.is_default,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the workflow-stage registry.
#[derive(Clone)]
pub struct SurrealStageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn name_taken(&self, name: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM workflow_status WHERE name = $name GROUP ALL")
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn insert(&self, input: CreateStage) -> Result<WorkflowStage, DbError> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('workflow_status', $id) SET \
                 name = $name, label = $label, order = $order, \
                 color = $color, description = $description, \
                 is_default = $is_default",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("label", input.label))
            .bind(("order", input.order))
            .bind(("color", input.color))
            .bind(("description", input.description))
            .bind(("is_default", input.is_default))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<StageRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_status".into(),
            id: id_str,
        })?;

        Ok(row.into_stage(id))
    }
}

impl<C: Connection> StageRepository for SurrealStageRepository<C> {
    async fn create(&self, input: CreateStage) -> CredimoResult<WorkflowStage> {
        if self.name_taken(&input.name).await? {
            return Err(CredimoError::AlreadyExists {
                entity: "estado".into(),
            });
        }

        Ok(self.insert(input).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> CredimoResult<WorkflowStage> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('workflow_status', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "estado".into(),
            id: id_str,
        })?;

        Ok(row.into_stage(id))
    }

    async fn get_by_name(&self, name: &str) -> CredimoResult<WorkflowStage> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow_status \
                 WHERE name = $name",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StageRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "estado".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_stage()?)
    }

    async fn update(&self, id: Uuid, input: UpdateStage) -> CredimoResult<WorkflowStage> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.label.is_some() {
            sets.push("label = $label");
        }
        if input.order.is_some() {
            sets.push("order = $order");
        }
        if input.color.is_some() {
            sets.push("color = $color");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('workflow_status', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(label) = input.label {
            builder = builder.bind(("label", label));
        }
        if let Some(order) = input.order {
            builder = builder.bind(("order", order));
        }
        if let Some(color) = input.color {
            builder = builder.bind(("color", color));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<StageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "estado".into(),
            id: id_str,
        })?;

        Ok(row.into_stage(id))
    }

    async fn delete(&self, id: Uuid) -> CredimoResult<()> {
        self.db
            .query("DELETE type::record('workflow_status', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self) -> CredimoResult<Vec<WorkflowStage>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow_status \
                 ORDER BY order ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StageRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_stage())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count(&self) -> CredimoResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM workflow_status GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn seed(&self, stages: Vec<CreateStage>) -> CredimoResult<()> {
        for stage in stages {
            self.insert(stage).await?;
        }
        Ok(())
    }

    async fn reorder(&self, orders: Vec<(Uuid, i64)>) -> CredimoResult<()> {
        // Single transaction so listings never observe a partial set.
        let mut statements = vec!["BEGIN TRANSACTION".to_string()];
        for (i, _) in orders.iter().enumerate() {
            statements.push(format!(
                "UPDATE type::record('workflow_status', $id_{i}) SET order = $order_{i}"
            ));
        }
        statements.push("COMMIT TRANSACTION".to_string());

        let query = statements.join("; ");
        let mut builder = self.db.query(&query);
        for (i, (id, order)) in orders.into_iter().enumerate() {
            builder = builder
                .bind((format!("id_{i}"), id.to_string()))
                .bind((format!("order_{i}"), order));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))
            .map_err(CredimoError::from)?;

        Ok(())
    }
}
