//! SurrealDB implementation of [`DeadlineRepository`].
//!
//! Due dates are ISO `YYYY-MM-DD` strings, so date-window queries are
//! plain lexicographic range comparisons.

use chrono::{DateTime, NaiveDate, Utc};
use credimo_core::error::CredimoResult;
use credimo_core::models::deadline::{CreateDeadline, Deadline, Priority, UpdateDeadline};
use credimo_core::repository::{DeadlineRepository, SchedulerScope};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, date_to_string, parse_date, parse_opt_uuid, parse_uuid};

#[derive(Debug, SurrealValue)]
struct DeadlineRow {
    case_id: Option<String>,
    title: String,
    description: Option<String>,
    due_date: String,
    priority: String,
    completed: bool,
    created_by: String,
    assigned_consultant_id: Option<String>,
    assigned_intermediary_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct DeadlineRowWithId {
    record_id: String,
    case_id: Option<String>,
    title: String,
    description: Option<String>,
    due_date: String,
    priority: String,
    completed: bool,
    created_by: String,
    assigned_consultant_id: Option<String>,
    assigned_intermediary_id: Option<String>,
    created_at: DateTime<Utc>,
}

pub(crate) fn parse_priority(s: &str) -> Result<Priority, DbError> {
    match s {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(DbError::Decode(format!("unknown priority: {other}"))),
    }
}

impl DeadlineRow {
    fn into_deadline(self, id: Uuid) -> Result<Deadline, DbError> {
        Ok(Deadline {
            id,
            case_id: parse_opt_uuid("process", self.case_id)?,
            title: self.title,
            description: self.description,
            due_date: parse_date(&self.due_date)?,
            priority: parse_priority(&self.priority)?,
            completed: self.completed,
            created_by: parse_uuid("user", &self.created_by)?,
            assigned_consultant_id: parse_opt_uuid("consultant", self.assigned_consultant_id)?,
            assigned_intermediary_id: parse_opt_uuid(
                "intermediary",
                self.assigned_intermediary_id,
            )?,
            created_at: self.created_at,
        })
    }
}

impl DeadlineRowWithId {
    fn try_into_deadline(self) -> Result<Deadline, DbError> {
        let id = parse_uuid("deadline", &self.record_id)?;
        let row = DeadlineRow {
            case_id: self.case_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            completed: self.completed,
            created_by: self.created_by,
            assigned_consultant_id: self.assigned_consultant_id,
            assigned_intermediary_id: self.assigned_intermediary_id,
            created_at: self.created_at,
        };
        row.into_deadline(id)
    }
}

/// Bind set produced by the scheduler-scope clause builder.
struct ScopeBinds {
    user_id: Option<String>,
    consultant_id: Option<String>,
    intermediary_id: Option<String>,
    case_ids: Option<Vec<String>>,
}

/// Turn a [`SchedulerScope`] into an OR-union WHERE fragment.
///
/// Scope [`SchedulerScope::All`] yields no fragment. An assignment
/// scope with nothing bound matches nothing.
fn scope_clause(scope: &SchedulerScope) -> (Option<String>, ScopeBinds) {
    let mut binds = ScopeBinds {
        user_id: None,
        consultant_id: None,
        intermediary_id: None,
        case_ids: None,
    };
    match scope {
        SchedulerScope::All => (None, binds),
        SchedulerScope::Visible { user_id, case_ids } => {
            binds.user_id = Some(user_id.to_string());
            binds.case_ids = Some(case_ids.iter().map(|id| id.to_string()).collect());
            let clause = "(created_by = $scope_user \
                 OR assigned_consultant_id = $scope_user \
                 OR assigned_intermediary_id = $scope_user \
                 OR case_id IN $scope_cases)";
            (Some(clause.to_string()), binds)
        }
        SchedulerScope::Assignment {
            consultant_id,
            intermediary_id,
            case_ids,
        } => {
            let mut parts = Vec::new();
            if let Some(id) = consultant_id {
                binds.consultant_id = Some(id.to_string());
                parts.push("assigned_consultant_id = $scope_consultant");
            }
            if let Some(id) = intermediary_id {
                binds.intermediary_id = Some(id.to_string());
                parts.push("assigned_intermediary_id = $scope_intermediary");
            }
            binds.case_ids = Some(case_ids.iter().map(|id| id.to_string()).collect());
            parts.push("case_id IN $scope_cases");
            (Some(format!("({})", parts.join(" OR "))), binds)
        }
    }
}

/// SurrealDB implementation of the deadline scheduler.
#[derive(Clone)]
pub struct SurrealDeadlineRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDeadlineRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DeadlineRepository for SurrealDeadlineRepository<C> {
    async fn create(&self, input: CreateDeadline) -> CredimoResult<Deadline> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('deadline', $id) SET \
                 case_id = $case_id, title = $title, \
                 description = $description, due_date = $due_date, \
                 priority = $priority, completed = false, \
                 created_by = $created_by, \
                 assigned_consultant_id = $assigned_consultant_id, \
                 assigned_intermediary_id = $assigned_intermediary_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("case_id", input.case_id.map(|v| v.to_string())))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("due_date", date_to_string(input.due_date)))
            .bind(("priority", input.priority.as_str().to_string()))
            .bind(("created_by", input.created_by.to_string()))
            .bind((
                "assigned_consultant_id",
                input.assigned_consultant_id.map(|v| v.to_string()),
            ))
            .bind((
                "assigned_intermediary_id",
                input.assigned_intermediary_id.map(|v| v.to_string()),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<DeadlineRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "prazo".into(),
            id: id_str,
        })?;

        Ok(row.into_deadline(id)?)
    }

    async fn get(&self, id: Uuid) -> CredimoResult<Deadline> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('deadline', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeadlineRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "prazo".into(),
            id: id_str,
        })?;

        Ok(row.into_deadline(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateDeadline) -> CredimoResult<Deadline> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.due_date.is_some() {
            sets.push("due_date = $due_date");
        }
        if input.priority.is_some() {
            sets.push("priority = $priority");
        }
        if input.completed.is_some() {
            sets.push("completed = $completed");
        }
        if input.assigned_consultant_id.is_some() {
            sets.push("assigned_consultant_id = $assigned_consultant_id");
        }
        if input.assigned_intermediary_id.is_some() {
            sets.push("assigned_intermediary_id = $assigned_intermediary_id");
        }

        if sets.is_empty() {
            return self.get(id).await;
        }

        let query = format!(
            "UPDATE type::record('deadline', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(due_date) = input.due_date {
            builder = builder.bind(("due_date", date_to_string(due_date)));
        }
        if let Some(priority) = input.priority {
            builder = builder.bind(("priority", priority.as_str().to_string()));
        }
        if let Some(completed) = input.completed {
            builder = builder.bind(("completed", completed));
        }
        if let Some(assigned) = input.assigned_consultant_id {
            builder = builder.bind(("assigned_consultant_id", assigned.map(|v| v.to_string())));
        }
        if let Some(assigned) = input.assigned_intermediary_id {
            builder = builder.bind(("assigned_intermediary_id", assigned.map(|v| v.to_string())));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<DeadlineRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "prazo".into(),
            id: id_str,
        })?;

        Ok(row.into_deadline(id)?)
    }

    async fn delete(&self, id: Uuid) -> CredimoResult<()> {
        self.db
            .query("DELETE type::record('deadline', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        scope: &SchedulerScope,
        due_from: Option<NaiveDate>,
        due_to: Option<NaiveDate>,
    ) -> CredimoResult<Vec<Deadline>> {
        let (scope_fragment, binds) = scope_clause(scope);

        let mut clauses = Vec::new();
        if let Some(fragment) = scope_fragment {
            clauses.push(fragment);
        }
        if due_from.is_some() {
            clauses.push("due_date >= $due_from".into());
        }
        if due_to.is_some() {
            clauses.push("due_date <= $due_to".into());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", clauses.join(" AND "))
        };

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM deadline \
             {where_clause}ORDER BY due_date ASC"
        );

        let mut builder = self.db.query(&query);
        if let Some(user_id) = binds.user_id {
            builder = builder.bind(("scope_user", user_id));
        }
        if let Some(consultant_id) = binds.consultant_id {
            builder = builder.bind(("scope_consultant", consultant_id));
        }
        if let Some(intermediary_id) = binds.intermediary_id {
            builder = builder.bind(("scope_intermediary", intermediary_id));
        }
        if let Some(case_ids) = binds.case_ids {
            builder = builder.bind(("scope_cases", case_ids));
        }
        if let Some(from) = due_from {
            builder = builder.bind(("due_from", date_to_string(from)));
        }
        if let Some(to) = due_to {
            builder = builder.bind(("due_to", date_to_string(to)));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<DeadlineRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_deadline())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count_pending(&self, scope: &SchedulerScope) -> CredimoResult<u64> {
        let (scope_fragment, binds) = scope_clause(scope);

        let query = match scope_fragment {
            Some(fragment) => format!(
                "SELECT count() AS total FROM deadline \
                 WHERE completed = false AND {fragment} GROUP ALL"
            ),
            None => {
                "SELECT count() AS total FROM deadline WHERE completed = false GROUP ALL"
                    .to_string()
            }
        };

        let mut builder = self.db.query(&query);
        if let Some(user_id) = binds.user_id {
            builder = builder.bind(("scope_user", user_id));
        }
        if let Some(consultant_id) = binds.consultant_id {
            builder = builder.bind(("scope_consultant", consultant_id));
        }
        if let Some(intermediary_id) = binds.intermediary_id {
            builder = builder.bind(("scope_intermediary", intermediary_id));
        }
        if let Some(case_ids) = binds.case_ids {
            builder = builder.bind(("scope_cases", case_ids));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
