//! Workflow-stage registry endpoints. Reads are open to any
//! authenticated caller; mutations are administrator-only.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use credimo_core::models::stage::{CreateStage, UpdateStage, WorkflowStage};
use credimo_core::policy::Principal;
use credimo_core::repository::{CaseRepository, StageRepository};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Auth;
use crate::state::AppState;

fn require_stage_admin(principal: &Principal) -> ApiResult<()> {
    if !principal.role.can_manage_stages() {
        return Err(ApiError::Forbidden(
            "Acesso negado: apenas administradores gerem os estados".into(),
        ));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Auth(_principal): Auth,
) -> ApiResult<Json<Vec<WorkflowStage>>> {
    Ok(Json(state.stages.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateStageRequest {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CreateStageRequest>,
) -> ApiResult<(StatusCode, Json<WorkflowStage>)> {
    require_stage_admin(&principal)?;

    if req.name.trim().is_empty() || req.label.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: nome e etiqueta são obrigatórios".into(),
        ));
    }

    // New stages land at the end of the pipeline unless placed.
    let order = match req.order {
        Some(order) => order,
        None => {
            state
                .stages
                .list()
                .await?
                .last()
                .map(|s| s.order + 1)
                .unwrap_or(1)
        }
    };

    let stage = state
        .stages
        .create(CreateStage {
            name: req.name,
            label: req.label,
            order,
            color: req.color,
            description: req.description,
            is_default: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(stage)))
}

pub async fn update(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStage>,
) -> ApiResult<Json<WorkflowStage>> {
    require_stage_admin(&principal)?;
    Ok(Json(state.stages.update(id, req).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_stage_admin(&principal)?;

    let stage = state.stages.get_by_id(id).await?;
    if stage.is_default {
        return Err(ApiError::BadRequest(
            "Não é possível eliminar um estado predefinido".into(),
        ));
    }

    let in_use = state.cases.count_referencing_status(&stage.name).await?;
    if in_use > 0 {
        return Err(ApiError::BadRequest(format!(
            "Não é possível eliminar: {in_use} processo(s) encontram-se neste estado"
        )));
    }

    state.stages.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub order: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub orders: Vec<ReorderEntry>,
}

pub async fn reorder(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<WorkflowStage>>> {
    require_stage_admin(&principal)?;

    if req.orders.is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: lista de ordenação vazia".into(),
        ));
    }

    state
        .stages
        .reorder(req.orders.into_iter().map(|e| (e.id, e.order)).collect())
        .await?;

    Ok(Json(state.stages.list().await?))
}
