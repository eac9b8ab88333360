//! Deadline, task and calendar endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use credimo_core::error::CredimoError;
use credimo_core::models::case::Case;
use credimo_core::models::deadline::{
    CalendarEntry, CreateDeadline, Deadline, Priority, UpdateDeadline,
};
use credimo_core::models::history::{CreateHistoryEntry, actions};
use credimo_core::models::task::{CreateTask, Task, UpdateTask};
use credimo_core::policy::{CaseScope, Principal};
use credimo_core::repository::{
    CaseRepository, DeadlineRepository, HistoryRepository, SchedulerScope, TaskRepository,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Auth;
use crate::notify;
use crate::routes::{require_staff, scheduler_scope, visible_case};
use crate::state::AppState;

// -----------------------------------------------------------------------
// Deadlines
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DeadlineQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub async fn list_deadlines(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<DeadlineQuery>,
) -> ApiResult<Json<Vec<Deadline>>> {
    let scope = scheduler_scope(&state, &principal).await?;
    Ok(Json(
        state.deadlines.list(&scope, query.from, query.to).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateDeadlineRequest {
    #[serde(default)]
    pub case_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_consultant_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_intermediary_id: Option<Uuid>,
}

fn default_priority() -> Priority {
    Priority::Medium
}

pub async fn create_deadline(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CreateDeadlineRequest>,
) -> ApiResult<(StatusCode, Json<Deadline>)> {
    require_staff(&principal)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: o título é obrigatório".into(),
        ));
    }
    if let Some(case_id) = req.case_id {
        visible_case(&state, &principal, case_id).await?;
    }

    let deadline = state
        .deadlines
        .create(CreateDeadline {
            case_id: req.case_id,
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            created_by: principal.user_id,
            assigned_consultant_id: req.assigned_consultant_id,
            assigned_intermediary_id: req.assigned_intermediary_id,
        })
        .await?;

    notify::deadline_assigned(&state, &deadline);
    Ok((StatusCode::CREATED, Json(deadline)))
}

/// A deadline is editable by its creator, its assignees and any
/// all-scope role. Out-of-reach rows answer like missing ones.
fn deadline_reachable(principal: &Principal, deadline: &Deadline, case_ids: &[Uuid]) -> bool {
    if principal.case_scope() == CaseScope::All {
        return true;
    }
    deadline.created_by == principal.user_id
        || deadline.assigned_consultant_id == Some(principal.user_id)
        || deadline.assigned_intermediary_id == Some(principal.user_id)
        || deadline
            .case_id
            .is_some_and(|case_id| case_ids.contains(&case_id))
}

async fn fetch_reachable_deadline(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> ApiResult<Deadline> {
    let deadline = state.deadlines.get(id).await?;
    let case_ids = if principal.case_scope() == CaseScope::All {
        vec![]
    } else {
        state.cases.list_ids(&principal.case_scope()).await?
    };
    if !deadline_reachable(principal, &deadline, &case_ids) {
        return Err(CredimoError::not_found("prazo", id).into());
    }
    Ok(deadline)
}

pub async fn update_deadline(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeadline>,
) -> ApiResult<Json<Deadline>> {
    require_staff(&principal)?;
    let before = fetch_reachable_deadline(&state, &principal, id).await?;

    let newly_completed = req.completed == Some(true) && !before.completed;
    let reassigned =
        req.assigned_consultant_id.is_some() || req.assigned_intermediary_id.is_some();
    let updated = state.deadlines.update(id, req).await?;

    if reassigned {
        notify::deadline_assigned(&state, &updated);
    }

    // Completion is recorded on the case once, on the first flip.
    if newly_completed {
        if let Some(case_id) = updated.case_id {
            state
                .history
                .append(CreateHistoryEntry {
                    case_id,
                    author_id: principal.user_id,
                    author_name: principal.name.clone(),
                    action: actions::DEADLINE_COMPLETED.into(),
                    field: None,
                    old_value: None,
                    new_value: Some(updated.title.clone()),
                })
                .await?;
        }
    }

    Ok(Json(updated))
}

pub async fn delete_deadline(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_staff(&principal)?;
    fetch_reachable_deadline(&state, &principal, id).await?;
    state.deadlines.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------
// Calendar
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub consultor_id: Option<Uuid>,
    #[serde(default)]
    pub mediador_id: Option<Uuid>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Calendar view. Without binding parameters it shows the caller's
/// visible deadlines; `consultor_id`/`mediador_id` narrow it to the
/// union of items carrying that assignment and items on cases
/// carrying it.
pub async fn calendar(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<Vec<CalendarEntry>>> {
    require_staff(&principal)?;

    let scope = if query.consultor_id.is_none() && query.mediador_id.is_none() {
        scheduler_scope(&state, &principal).await?
    } else {
        let mut case_ids = Vec::new();
        if let Some(consultant_id) = query.consultor_id {
            case_ids.extend(
                state
                    .cases
                    .list_ids(&CaseScope::Consultant(consultant_id))
                    .await?,
            );
        }
        if let Some(intermediary_id) = query.mediador_id {
            case_ids.extend(
                state
                    .cases
                    .list_ids(&CaseScope::Intermediary(intermediary_id))
                    .await?,
            );
        }
        case_ids.sort_unstable();
        case_ids.dedup();
        SchedulerScope::Assignment {
            consultant_id: query.consultor_id,
            intermediary_id: query.mediador_id,
            case_ids,
        }
    };

    let deadlines = state.deadlines.list(&scope, query.from, query.to).await?;

    // Annotate case-bound entries with a client snapshot.
    let mut entries = Vec::with_capacity(deadlines.len());
    for deadline in deadlines {
        let case: Option<Case> = match deadline.case_id {
            Some(case_id) => state.cases.get(case_id).await.ok(),
            None => None,
        };
        entries.push(CalendarEntry {
            deadline,
            client_name: case.as_ref().map(|c| c.client_name.clone()),
            case_status: case.map(|c| c.status),
        });
    }

    Ok(Json(entries))
}

// -----------------------------------------------------------------------
// Tasks
// -----------------------------------------------------------------------

pub async fn list_tasks(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> ApiResult<Json<Vec<Task>>> {
    let scope = scheduler_scope(&state, &principal).await?;
    Ok(Json(state.tasks.list(&scope).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub case_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    require_staff(&principal)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: o título é obrigatório".into(),
        ));
    }
    if let Some(case_id) = req.case_id {
        visible_case(&state, &principal, case_id).await?;
    }

    let task = state
        .tasks
        .create(CreateTask {
            case_id: req.case_id,
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            created_by: principal.user_id,
            assigned_to: req.assigned_to,
        })
        .await?;

    notify::task_assigned(&state, &task);
    Ok((StatusCode::CREATED, Json(task)))
}

fn task_reachable(principal: &Principal, task: &Task, case_ids: &[Uuid]) -> bool {
    if principal.case_scope() == CaseScope::All {
        return true;
    }
    task.created_by == principal.user_id
        || task.assigned_to == Some(principal.user_id)
        || task
            .case_id
            .is_some_and(|case_id| case_ids.contains(&case_id))
}

async fn fetch_reachable_task(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> ApiResult<Task> {
    let task = state.tasks.get(id).await?;
    let case_ids = if principal.case_scope() == CaseScope::All {
        vec![]
    } else {
        state.cases.list_ids(&principal.case_scope()).await?
    };
    if !task_reachable(principal, &task, &case_ids) {
        return Err(CredimoError::not_found("tarefa", id).into());
    }
    Ok(task)
}

pub async fn update_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    require_staff(&principal)?;
    let before = fetch_reachable_task(&state, &principal, id).await?;

    let newly_completed = req.completed == Some(true) && !before.completed;
    let reassigned = req.assigned_to.is_some();
    let updated = state.tasks.update(id, req).await?;

    if reassigned {
        notify::task_assigned(&state, &updated);
    }

    if newly_completed {
        if let Some(case_id) = updated.case_id {
            state
                .history
                .append(CreateHistoryEntry {
                    case_id,
                    author_id: principal.user_id,
                    author_name: principal.name.clone(),
                    action: actions::TASK_COMPLETED.into(),
                    field: None,
                    old_value: None,
                    new_value: Some(updated.title.clone()),
                })
                .await?;
        }
    }

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_staff(&principal)?;
    fetch_reachable_task(&state, &principal, id).await?;
    state.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
