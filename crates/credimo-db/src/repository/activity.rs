//! SurrealDB implementation of [`ActivityRepository`].
//!
//! Activities are append-only; the table permissions forbid update
//! and delete.

use chrono::{DateTime, Utc};
use credimo_core::error::CredimoResult;
use credimo_core::models::activity::{Activity, CreateActivity};
use credimo_core::models::user::Role;
use credimo_core::repository::ActivityRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::parse_uuid;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    case_id: String,
    author_id: String,
    author_name: String,
    author_role: String,
    comment: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActivityRowWithId {
    record_id: String,
    case_id: String,
    author_id: String,
    author_name: String,
    author_role: String,
    comment: String,
    created_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown author role: {s}")))
}

impl ActivityRow {
    fn into_activity(self, id: Uuid) -> Result<Activity, DbError> {
        Ok(Activity {
            id,
            case_id: parse_uuid("process", &self.case_id)?,
            author_id: parse_uuid("user", &self.author_id)?,
            author_name: self.author_name,
            author_role: parse_role(&self.author_role)?,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

impl ActivityRowWithId {
    fn try_into_activity(self) -> Result<Activity, DbError> {
        let id = parse_uuid("activity", &self.record_id)?;
        Ok(Activity {
            id,
            case_id: parse_uuid("process", &self.case_id)?,
            author_id: parse_uuid("user", &self.author_id)?,
            author_name: self.author_name,
            author_role: parse_role(&self.author_role)?,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the activity log.
#[derive(Clone)]
pub struct SurrealActivityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityRepository for SurrealActivityRepository<C> {
    async fn append(&self, input: CreateActivity) -> CredimoResult<Activity> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('activity', $id) SET \
                 case_id = $case_id, author_id = $author_id, \
                 author_name = $author_name, author_role = $author_role, \
                 comment = $comment",
            )
            .bind(("id", id_str.clone()))
            .bind(("case_id", input.case_id.to_string()))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("author_name", input.author_name))
            .bind(("author_role", input.author_role.as_str().to_string()))
            .bind(("comment", input.comment))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "atividade".into(),
            id: id_str,
        })?;

        Ok(row.into_activity(id)?)
    }

    async fn list_by_case(&self, case_id: Uuid) -> CredimoResult<Vec<Activity>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM activity \
                 WHERE case_id = $case_id \
                 ORDER BY created_at DESC",
            )
            .bind(("case_id", case_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_activity())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
