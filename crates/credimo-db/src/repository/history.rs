//! SurrealDB implementation of [`HistoryRepository`].
//!
//! History is the append-only field-change audit; the table
//! permissions forbid update and delete.

use chrono::{DateTime, Utc};
use credimo_core::error::CredimoResult;
use credimo_core::models::history::{CreateHistoryEntry, HistoryEntry};
use credimo_core::repository::HistoryRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::parse_uuid;

#[derive(Debug, SurrealValue)]
struct HistoryRow {
    case_id: String,
    author_id: String,
    author_name: String,
    action: String,
    field: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct HistoryRowWithId {
    record_id: String,
    case_id: String,
    author_id: String,
    author_name: String,
    action: String,
    field: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_entry(self, id: Uuid) -> Result<HistoryEntry, DbError> {
        Ok(HistoryEntry {
            id,
            case_id: parse_uuid("process", &self.case_id)?,
            author_id: parse_uuid("user", &self.author_id)?,
            author_name: self.author_name,
            action: self.action,
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            created_at: self.created_at,
        })
    }
}

impl HistoryRowWithId {
    fn try_into_entry(self) -> Result<HistoryEntry, DbError> {
        let id = parse_uuid("history", &self.record_id)?;
        Ok(HistoryEntry {
            id,
            case_id: parse_uuid("process", &self.case_id)?,
            author_id: parse_uuid("user", &self.author_id)?,
            author_name: self.author_name,
            action: self.action,
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the case history audit.
#[derive(Clone)]
pub struct SurrealHistoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealHistoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> HistoryRepository for SurrealHistoryRepository<C> {
    async fn append(&self, input: CreateHistoryEntry) -> CredimoResult<HistoryEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('history', $id) SET \
                 case_id = $case_id, author_id = $author_id, \
                 author_name = $author_name, action = $action, \
                 field = $field, old_value = $old_value, \
                 new_value = $new_value",
            )
            .bind(("id", id_str.clone()))
            .bind(("case_id", input.case_id.to_string()))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("author_name", input.author_name))
            .bind(("action", input.action))
            .bind(("field", input.field))
            .bind(("old_value", input.old_value))
            .bind(("new_value", input.new_value))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<HistoryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "histórico".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list_by_case(&self, case_id: Uuid) -> CredimoResult<Vec<HistoryEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM history \
                 WHERE case_id = $case_id \
                 ORDER BY created_at DESC",
            )
            .bind(("case_id", case_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HistoryRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
