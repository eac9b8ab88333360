//! Route handlers, grouped by surface.

pub mod admin;
pub mod auth;
pub mod cases;
pub mod documents;
pub mod health;
pub mod notifications;
pub mod public;
pub mod scheduler;
pub mod stages;
pub mod stats;

use credimo_core::error::CredimoError;
use credimo_core::models::case::Case;
use credimo_core::policy::{CaseScope, Principal, case_visible};
use credimo_core::repository::{CaseRepository, SchedulerScope};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Load a case and enforce row visibility.
///
/// A row outside the caller's scope answers exactly like a missing
/// one, so its existence is never revealed.
pub(crate) async fn visible_case(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> ApiResult<Case> {
    let case = state.cases.get(id).await?;
    if !case_visible(&principal.case_scope(), &case) {
        return Err(CredimoError::not_found("processo", id).into());
    }
    Ok(case)
}

/// Derive the deadline/task row filter for the caller.
pub(crate) async fn scheduler_scope(
    state: &AppState,
    principal: &Principal,
) -> ApiResult<SchedulerScope> {
    let case_scope = principal.case_scope();
    if case_scope == CaseScope::All {
        return Ok(SchedulerScope::All);
    }
    let case_ids = state.cases.list_ids(&case_scope).await?;
    Ok(SchedulerScope::Visible {
        user_id: principal.user_id,
        case_ids,
    })
}

/// Guard for staff-only surfaces.
pub(crate) fn require_staff(principal: &Principal) -> ApiResult<()> {
    if !principal.role.is_staff() {
        return Err(ApiError::Forbidden(
            "Acesso negado: reservado à equipa".into(),
        ));
    }
    Ok(())
}
