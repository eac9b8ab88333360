//! Document-expiry endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{Duration, NaiveDate, Utc};
use credimo_core::models::document::{
    CreateDocumentExpiry, DocumentExpiry, DocumentType, UpdateDocumentExpiry,
};
use credimo_core::policy::CaseScope;
use credimo_core::repository::{CaseRepository, DocumentExpiryRepository};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::Auth;
use crate::routes::{require_staff, visible_case};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub process_id: Uuid,
}

pub async fn list_documents(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<DocumentListQuery>,
) -> ApiResult<Json<Vec<DocumentExpiry>>> {
    let case = visible_case(&state, &principal, query.process_id).await?;
    Ok(Json(state.documents.list_by_case(case.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub process_id: Uuid,
    pub document_type: DocumentType,
    pub document_name: String,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn create_document(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentExpiry>)> {
    require_staff(&principal)?;
    let case = visible_case(&state, &principal, req.process_id).await?;

    let document = state
        .documents
        .create(CreateDocumentExpiry {
            case_id: case.id,
            document_type: req.document_type,
            document_name: req.document_name,
            expiry_date: req.expiry_date,
            notes: req.notes,
            created_by: principal.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update_document(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocumentExpiry>,
) -> ApiResult<Json<DocumentExpiry>> {
    require_staff(&principal)?;
    let document = state.documents.get(id).await?;
    visible_case(&state, &principal, document.case_id).await?;
    Ok(Json(state.documents.update(id, req).await?))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_staff(&principal)?;
    let document = state.documents.get(id).await?;
    visible_case(&state, &principal, document.case_id).await?;
    state.documents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

/// Documents expiring within the next `days` days, restricted to the
/// caller's visible cases.
pub async fn upcoming_documents(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<DocumentExpiry>>> {
    require_staff(&principal)?;

    let today = Utc::now().date_naive();
    let until = today + Duration::days(query.days.max(0));

    let case_ids = match principal.case_scope() {
        CaseScope::All => None,
        scope => Some(state.cases.list_ids(&scope).await?),
    };

    Ok(Json(state.documents.upcoming(today, until, case_ids).await?))
}
