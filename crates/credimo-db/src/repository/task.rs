//! SurrealDB implementation of [`TaskRepository`].

use chrono::{DateTime, Utc};
use credimo_core::error::CredimoResult;
use credimo_core::models::task::{CreateTask, Task, UpdateTask};
use credimo_core::repository::{SchedulerScope, TaskRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::deadline::parse_priority;
use crate::repository::{CountRow, date_to_string, parse_date, parse_opt_uuid, parse_uuid};

#[derive(Debug, SurrealValue)]
struct TaskRow {
    case_id: Option<String>,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    priority: String,
    completed: bool,
    created_by: String,
    assigned_to: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TaskRowWithId {
    record_id: String,
    case_id: Option<String>,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    priority: String,
    completed: bool,
    created_by: String,
    assigned_to: Option<String>,
    created_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<Task, DbError> {
        Ok(Task {
            id,
            case_id: parse_opt_uuid("process", self.case_id)?,
            title: self.title,
            description: self.description,
            due_date: self.due_date.as_deref().map(parse_date).transpose()?,
            priority: parse_priority(&self.priority)?,
            completed: self.completed,
            created_by: parse_uuid("user", &self.created_by)?,
            assigned_to: parse_opt_uuid("user", self.assigned_to)?,
            created_at: self.created_at,
        })
    }
}

impl TaskRowWithId {
    fn try_into_task(self) -> Result<Task, DbError> {
        let id = parse_uuid("task", &self.record_id)?;
        let row = TaskRow {
            case_id: self.case_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            completed: self.completed,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            created_at: self.created_at,
        };
        row.into_task(id)
    }
}

struct ScopeBinds {
    user_id: Option<String>,
    consultant_id: Option<String>,
    intermediary_id: Option<String>,
    case_ids: Option<Vec<String>>,
}

/// Tasks carry a single `assigned_to`; a calendar assignment filter
/// matches it against either queried assignee.
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
                 OR assigned_to = $scope_user \
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
                parts.push("assigned_to = $scope_consultant");
            }
            if let Some(id) = intermediary_id {
                binds.intermediary_id = Some(id.to_string());
                parts.push("assigned_to = $scope_intermediary");
            }
            binds.case_ids = Some(case_ids.iter().map(|id| id.to_string()).collect());
            parts.push("case_id IN $scope_cases");
            (Some(format!("({})", parts.join(" OR "))), binds)
        }
    }
}

/// SurrealDB implementation of the task scheduler.
#[derive(Clone)]
pub struct SurrealTaskRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTaskRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TaskRepository for SurrealTaskRepository<C> {
    async fn create(&self, input: CreateTask) -> CredimoResult<Task> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('task', $id) SET \
                 case_id = $case_id, title = $title, \
                 description = $description, due_date = $due_date, \
                 priority = $priority, completed = false, \
                 created_by = $created_by, assigned_to = $assigned_to",
            )
            .bind(("id", id_str.clone()))
            .bind(("case_id", input.case_id.map(|v| v.to_string())))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("due_date", input.due_date.map(date_to_string)))
            .bind(("priority", input.priority.as_str().to_string()))
            .bind(("created_by", input.created_by.to_string()))
            .bind(("assigned_to", input.assigned_to.map(|v| v.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tarefa".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn get(&self, id: Uuid) -> CredimoResult<Task> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('task', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tarefa".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTask) -> CredimoResult<Task> {
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
        if input.assigned_to.is_some() {
            sets.push("assigned_to = $assigned_to");
        }

        if sets.is_empty() {
            return self.get(id).await;
        }

        let query = format!("UPDATE type::record('task', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(due_date) = input.due_date {
            builder = builder.bind(("due_date", due_date.map(date_to_string)));
        }
        if let Some(priority) = input.priority {
            builder = builder.bind(("priority", priority.as_str().to_string()));
        }
        if let Some(completed) = input.completed {
            builder = builder.bind(("completed", completed));
        }
        if let Some(assigned_to) = input.assigned_to {
            builder = builder.bind(("assigned_to", assigned_to.map(|v| v.to_string())));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tarefa".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn delete(&self, id: Uuid) -> CredimoResult<()> {
        self.db
            .query("DELETE type::record('task', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, scope: &SchedulerScope) -> CredimoResult<Vec<Task>> {
        let (scope_fragment, binds) = scope_clause(scope);

        let query = match scope_fragment {
            Some(fragment) => format!(
                "SELECT meta::id(id) AS record_id, * FROM task \
                 WHERE {fragment} ORDER BY created_at DESC"
            ),
            None => {
                "SELECT meta::id(id) AS record_id, * FROM task ORDER BY created_at DESC"
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
        let rows: Vec<TaskRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_task())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count_pending(&self, scope: &SchedulerScope) -> CredimoResult<u64> {
        let (scope_fragment, binds) = scope_clause(scope);

        let query = match scope_fragment {
            Some(fragment) => format!(
                "SELECT count() AS total FROM task \
                 WHERE completed = false AND {fragment} GROUP ALL"
            ),
            None => {
                "SELECT count() AS total FROM task WHERE completed = false GROUP ALL".to_string()
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
