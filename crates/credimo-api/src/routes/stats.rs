//! Dashboard counters, all computed inside the caller's scope.

use axum::Json;
use axum::extract::State;
use credimo_core::models::stage::{COMPLETED_STAGE, DROPPED_STAGE};
use credimo_core::repository::{
    CaseRepository, DeadlineRepository, StageRepository, TaskRepository, UserRepository,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::extract::Auth;
use crate::routes::scheduler_scope;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StageCount {
    pub status: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_cases: u64,
    /// Cases in neither terminal stage.
    pub active_cases: u64,
    pub concluded_cases: u64,
    pub dropped_cases: u64,
    pub cases_by_status: Vec<StageCount>,
    pub pending_deadlines: u64,
    pub pending_tasks: u64,
    /// Present only for roles that oversee the team.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<UserCounts>,
}

pub async fn stats(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> ApiResult<Json<StatsResponse>> {
    let case_scope = principal.case_scope();
    let total_cases = state.cases.count(&case_scope).await?;

    let mut cases_by_status = Vec::new();
    let mut concluded_cases = 0;
    let mut dropped_cases = 0;
    for stage in state.stages.list().await? {
        let count = state.cases.count_by_status(&case_scope, &stage.name).await?;
        match stage.name.as_str() {
            COMPLETED_STAGE => concluded_cases = count,
            DROPPED_STAGE => dropped_cases = count,
            _ => {}
        }
        cases_by_status.push(StageCount {
            status: stage.name,
            label: stage.label,
            count,
        });
    }
    let active_cases = total_cases.saturating_sub(concluded_cases + dropped_cases);

    let scope = scheduler_scope(&state, &principal).await?;
    let pending_deadlines = state.deadlines.count_pending(&scope).await?;
    let pending_tasks = state.tasks.count_pending(&scope).await?;

    let users = if principal.role.sees_user_counts() {
        Some(UserCounts {
            total: state.users.count().await?,
            active: state.users.count_active().await?,
        })
    } else {
        None
    };

    Ok(Json(StatsResponse {
        total_cases,
        active_cases,
        concluded_cases,
        dropped_cases,
        cases_by_status,
        pending_deadlines,
        pending_tasks,
        users,
    }))
}
