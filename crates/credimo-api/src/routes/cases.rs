//! Case endpoints: listing, intake, updates, transitions, assignment,
//! audit trails and derived alerts.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use credimo_core::alerts::{self, CaseAlerts};
use credimo_core::error::CredimoError;
use credimo_core::fiscal;
use credimo_core::models::activity::{Activity, CreateActivity};
use credimo_core::models::case::{Case, CaseUpdate, CreateCase, ProcessType};
use credimo_core::models::history::{CreateHistoryEntry, HistoryEntry, actions};
use credimo_core::models::stage::PRE_APPROVAL_STAGE;
use credimo_core::models::user::{CreateUser, Role, User};
use credimo_core::policy::{CreditAccess, Principal};
use credimo_core::repository::{
    ActivityRepository, CaseFilter, CaseRepository, DocumentExpiryRepository, HistoryRepository,
    Pagination, StageRepository, UserRepository,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Auth;
use crate::notify;
use crate::routes::{require_staff, visible_case};
use crate::state::AppState;

// -----------------------------------------------------------------------
// Listing
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub process_type: Option<ProcessType>,
    #[serde(default)]
    pub consultant_id: Option<Uuid>,
    #[serde(default)]
    pub intermediary_id: Option<Uuid>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CasePage {
    pub items: Vec<Case>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub async fn list(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CasePage>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        offset: query.offset.unwrap_or(defaults.offset),
        limit: query.limit.unwrap_or(defaults.limit).min(200),
    };

    let filter = CaseFilter {
        status: query.status,
        process_type: query.process_type,
        consultant_id: query.consultant_id,
        intermediary_id: query.intermediary_id,
        search: query.search,
    };

    let page = state
        .cases
        .list(&principal.case_scope(), &filter, pagination)
        .await?;

    Ok(Json(CasePage {
        items: page.items,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}

// -----------------------------------------------------------------------
// Creation (staff intake)
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCaseRequest {
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    pub process_type: ProcessType,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub personal_data: Option<credimo_core::models::case::PersonalData>,
    #[serde(default)]
    pub financial_data: Option<credimo_core::models::case::FinancialData>,
    #[serde(default)]
    pub real_estate_data: Option<credimo_core::models::case::RealEstateData>,
    #[serde(default)]
    pub assigned_consultant_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_intermediary_id: Option<Uuid>,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

async fn resolve_client(state: &AppState, name: &str, email: &str, phone: Option<&str>) -> ApiResult<User> {
    match state.users.get_by_email(email).await {
        Ok(user) => Ok(user),
        Err(CredimoError::NotFound { .. }) => Ok(state
            .users
            .create(CreateUser {
                email: email.into(),
                name: name.into(),
                phone: phone.map(Into::into),
                role: Role::Client,
                password: None,
                cloud_folder: None,
            })
            .await?),
        Err(e) => Err(e.into()),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CreateCaseRequest>,
) -> ApiResult<(StatusCode, Json<Case>)> {
    require_staff(&principal)?;

    let mut personal_data = req.personal_data.unwrap_or_default();
    if let Some(raw) = personal_data.nif.as_deref() {
        personal_data.nif = Some(fiscal::normalize_nif(raw)?);
    }

    let today = Utc::now().date_naive();
    let age_under_35 = personal_data
        .birth_date
        .is_some_and(|birth| fiscal::age_under_35(birth, today));

    let client = resolve_client(
        &state,
        &req.client_name,
        &req.client_email,
        req.client_phone.as_deref(),
    )
    .await?;

    // Requested stage must exist; default is the pipeline entry stage.
    let status = match req.status {
        Some(name) => {
            state.stages.get_by_name(&name).await.map_err(|e| match e {
                CredimoError::NotFound { .. } => {
                    CredimoError::validation(format!("estado desconhecido: {name}"))
                }
                other => other,
            })?;
            name
        }
        None => {
            state
                .stages
                .list()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::Internal("pipeline vazio".into()))?
                .name
        }
    };

    let case = state
        .cases
        .create(CreateCase {
            client_id: client.id,
            client_name: client.name.clone(),
            client_email: client.email.clone(),
            client_phone: req.client_phone,
            process_type: req.process_type,
            status,
            personal_data,
            second_holder_data: Default::default(),
            financial_data: req.financial_data.unwrap_or_default(),
            real_estate_data: req.real_estate_data.unwrap_or_default(),
            credit_data: Default::default(),
            assigned_consultant_id: req.assigned_consultant_id,
            assigned_intermediary_id: req.assigned_intermediary_id,
            age_under_35,
            priority: req.priority,
            notes: req.notes,
            tags: req.tags,
        })
        .await?;

    state
        .history
        .append(CreateHistoryEntry {
            case_id: case.id,
            author_id: principal.user_id,
            author_name: principal.name.clone(),
            action: actions::CREATED.into(),
            field: None,
            old_value: None,
            new_value: None,
        })
        .await?;

    notify::case_created(&state, &case);
    let newly_assigned: Vec<Uuid> = [case.assigned_consultant_id, case.assigned_intermediary_id]
        .into_iter()
        .flatten()
        .collect();
    if !newly_assigned.is_empty() {
        notify::case_assigned(&state, &case, newly_assigned);
    }

    Ok((StatusCode::CREATED, Json(case)))
}

// -----------------------------------------------------------------------
// Read / update
// -----------------------------------------------------------------------

pub async fn get(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Case>> {
    let case = visible_case(&state, &principal, id).await?;
    Ok(Json(case))
}

/// Gate on writing credit terms: consultants and intermediaries must
/// wait until the case stage has reached pre-approval order.
///
/// `status` is the stage the case will be in after the request, so a
/// single update moving the case into pre-approval may write credit
/// data in the same breath.
async fn enforce_credit_gate(
    state: &AppState,
    principal: &Principal,
    status: &str,
) -> ApiResult<()> {
    match principal.role.credit_access() {
        CreditAccess::Always => Ok(()),
        CreditAccess::Never => Err(ApiError::Forbidden(
            "Acesso negado: sem permissão para editar dados de crédito".into(),
        )),
        CreditAccess::AfterPreApproval => {
            let target = state.stages.get_by_name(status).await.map_err(|e| match e {
                CredimoError::NotFound { .. } => {
                    CredimoError::validation(format!("estado desconhecido: {status}"))
                }
                other => other,
            })?;
            let gate = state.stages.get_by_name(PRE_APPROVAL_STAGE).await?;
            if target.order >= gate.order {
                Ok(())
            } else {
                Err(CredimoError::BankAuthorizationRequired {
                    message: "mova o processo para pré-aprovação antes de editar os dados de crédito"
                        .into(),
                }
                .into())
            }
        }
    }
}

/// Apply a transition to `new_status`, stamping the pre-approval date
/// on the first entry into that stage and recording one history entry.
async fn transition(
    state: &AppState,
    principal: &Principal,
    case: &mut Case,
    new_status: &str,
) -> ApiResult<()> {
    if !principal.role.can_change_status() {
        return Err(ApiError::Forbidden(
            "Acesso negado: sem permissão para alterar o estado".into(),
        ));
    }

    if case.status == new_status {
        return Ok(());
    }

    let stage = state
        .stages
        .get_by_name(new_status)
        .await
        .map_err(|e| match e {
            CredimoError::NotFound { .. } => {
                CredimoError::validation(format!("estado desconhecido: {new_status}"))
            }
            other => other,
        })?;

    let old_status = std::mem::replace(&mut case.status, stage.name.clone());

    if stage.name == PRE_APPROVAL_STAGE && case.pre_approval_date.is_none() {
        case.pre_approval_date = Some(Utc::now());
    }

    state
        .history
        .append(CreateHistoryEntry {
            case_id: case.id,
            author_id: principal.user_id,
            author_name: principal.name.clone(),
            action: actions::STATUS_CHANGED.into(),
            field: Some("status".into()),
            old_value: Some(old_status),
            new_value: Some(stage.name),
        })
        .await?;

    Ok(())
}

pub async fn update(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(mut update): Json<CaseUpdate>,
) -> ApiResult<Json<Case>> {
    require_staff(&principal)?;
    let mut case = visible_case(&state, &principal, id).await?;

    if update.touches_credit_data() {
        // Gate on the stage the case lands in, not the one it leaves.
        let target = update.status.as_deref().unwrap_or(&case.status);
        enforce_credit_gate(&state, &principal, target).await?;
    }

    if let Some(bag) = update.personal_data.as_mut() {
        if let Some(raw) = bag.nif.as_deref() {
            bag.nif = Some(fiscal::normalize_nif(raw)?);
        }
    }

    if let Some(new_status) = &update.status {
        transition(&state, &principal, &mut case, new_status).await?;
    }

    let changes = case.apply(&update);

    for change in &changes {
        state
            .history
            .append(CreateHistoryEntry {
                case_id: case.id,
                author_id: principal.user_id,
                author_name: principal.name.clone(),
                action: actions::UPDATED.into(),
                field: Some(change.field.clone()),
                old_value: change.old.clone(),
                new_value: change.new.clone(),
            })
            .await?;
    }

    let saved = state.cases.save(&case).await?;
    Ok(Json(saved))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn change_status(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Case>> {
    let mut case = visible_case(&state, &principal, id).await?;
    transition(&state, &principal, &mut case, &req.status).await?;
    let saved = state.cases.save(&case).await?;
    Ok(Json(saved))
}

// -----------------------------------------------------------------------
// Assignment
// -----------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignRequest {
    /// `Some(None)` clears the assignment, absent keeps it.
    #[serde(with = "credimo_core::serde_util::double_option")]
    pub consultant_id: Option<Option<Uuid>>,
    #[serde(with = "credimo_core::serde_util::double_option")]
    pub intermediary_id: Option<Option<Uuid>>,
}

async fn check_assignee(state: &AppState, id: Uuid, accepted: &[Role]) -> ApiResult<User> {
    let user = state.users.get_by_id(id).await?;
    if !user.active || !accepted.contains(&user.role) {
        return Err(CredimoError::validation(format!(
            "o utilizador {} não pode receber esta atribuição",
            user.name
        ))
        .into());
    }
    Ok(user)
}

pub async fn assign(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Case>> {
    if !principal.role.can_assign() {
        return Err(ApiError::Forbidden(
            "Acesso negado: sem permissão para atribuir processos".into(),
        ));
    }

    let mut case = visible_case(&state, &principal, id).await?;
    let mut newly_assigned = Vec::new();

    if let Some(consultant) = req.consultant_id {
        if let Some(consultant_id) = consultant {
            check_assignee(
                &state,
                consultant_id,
                &[Role::Consultant, Role::ConsultantIntermediary],
            )
            .await?;
        }
        if case.assigned_consultant_id != consultant {
            state
                .history
                .append(CreateHistoryEntry {
                    case_id: case.id,
                    author_id: principal.user_id,
                    author_name: principal.name.clone(),
                    action: actions::ASSIGNED.into(),
                    field: Some("assigned_consultant_id".into()),
                    old_value: case.assigned_consultant_id.map(|v| v.to_string()),
                    new_value: consultant.map(|v| v.to_string()),
                })
                .await?;
            case.assigned_consultant_id = consultant;
            if let Some(consultant_id) = consultant {
                newly_assigned.push(consultant_id);
            }
        }
    }

    if let Some(intermediary) = req.intermediary_id {
        if let Some(intermediary_id) = intermediary {
            check_assignee(
                &state,
                intermediary_id,
                &[Role::Intermediary, Role::ConsultantIntermediary],
            )
            .await?;
        }
        if case.assigned_intermediary_id != intermediary {
            state
                .history
                .append(CreateHistoryEntry {
                    case_id: case.id,
                    author_id: principal.user_id,
                    author_name: principal.name.clone(),
                    action: actions::ASSIGNED.into(),
                    field: Some("assigned_intermediary_id".into()),
                    old_value: case.assigned_intermediary_id.map(|v| v.to_string()),
                    new_value: intermediary.map(|v| v.to_string()),
                })
                .await?;
            case.assigned_intermediary_id = intermediary;
            if let Some(intermediary_id) = intermediary {
                newly_assigned.push(intermediary_id);
            }
        }
    }

    let saved = state.cases.save(&case).await?;
    if !newly_assigned.is_empty() {
        notify::case_assigned(&state, &saved, newly_assigned);
    }

    Ok(Json(saved))
}

// -----------------------------------------------------------------------
// Alerts
// -----------------------------------------------------------------------

pub async fn case_alerts(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CaseAlerts>> {
    let case = visible_case(&state, &principal, id).await?;
    let documents = state.documents.list_by_case(case.id).await?;
    Ok(Json(alerts::evaluate(&case, &documents, Utc::now())))
}

// -----------------------------------------------------------------------
// Activities and history
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub process_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub process_id: Uuid,
    pub comment: String,
}

pub async fn list_activities(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<Activity>>> {
    let case = visible_case(&state, &principal, query.process_id).await?;
    Ok(Json(state.activities.list_by_case(case.id).await?))
}

pub async fn add_activity(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    if req.comment.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: o comentário não pode estar vazio".into(),
        ));
    }

    let case = visible_case(&state, &principal, req.process_id).await?;
    let activity = state
        .activities
        .append(CreateActivity {
            case_id: case.id,
            author_id: principal.user_id,
            author_name: principal.name,
            author_role: principal.role,
            comment: req.comment,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn list_history(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let case = visible_case(&state, &principal, query.process_id).await?;
    Ok(Json(state.history.list_by_case(case.id).await?))
}
