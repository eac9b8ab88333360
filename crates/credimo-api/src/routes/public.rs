//! Unauthenticated public intake form.
//!
//! Creates (or reuses) a CLIENT account keyed on the email and opens
//! a case in the first pipeline stage. The client account cannot
//! authenticate until a password is set by staff.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use credimo_core::error::CredimoError;
use credimo_core::fiscal;
use credimo_core::models::case::{CreateCase, PersonalData, ProcessType};
use credimo_core::models::history::{CreateHistoryEntry, actions};
use credimo_core::models::user::{CreateUser, Role, User};
use credimo_core::repository::{CaseRepository, HistoryRepository, StageRepository, UserRepository};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::notify;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClientRegistration {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub process_type: Option<ProcessType>,
    #[serde(default)]
    pub personal_data: PersonalData,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Reuse the client account when the email is already registered;
/// otherwise create a password-less CLIENT.
async fn resolve_client(state: &AppState, reg: &ClientRegistration) -> ApiResult<User> {
    match state.users.get_by_email(&reg.email).await {
        Ok(user) => Ok(user),
        Err(CredimoError::NotFound { .. }) => Ok(state
            .users
            .create(CreateUser {
                email: reg.email.clone(),
                name: reg.name.clone(),
                phone: reg.phone.clone(),
                role: Role::Client,
                password: None,
                cloud_folder: None,
            })
            .await?),
        Err(e) => Err(e.into()),
    }
}

pub async fn client_registration(
    State(state): State<AppState>,
    Json(reg): Json<ClientRegistration>,
) -> ApiResult<Json<Value>> {
    if reg.name.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: o nome é obrigatório".into(),
        ));
    }
    if !reg.email.contains('@') {
        return Err(ApiError::Unprocessable(
            "Erro de validação: email inválido".into(),
        ));
    }

    let mut personal_data = reg.personal_data.clone();
    if let Some(raw) = personal_data.nif.as_deref() {
        personal_data.nif = Some(fiscal::normalize_nif(raw)?);
    }

    let today = Utc::now().date_naive();
    let age_under_35 = personal_data
        .birth_date
        .is_some_and(|birth| fiscal::age_under_35(birth, today));

    let client = resolve_client(&state, &reg).await?;

    // Intake always enters at the lowest-order stage.
    let first_stage = state
        .stages
        .list()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("pipeline vazio".into()))?;

    let case = state
        .cases
        .create(CreateCase {
            client_id: client.id,
            client_name: client.name.clone(),
            client_email: client.email.clone(),
            client_phone: reg.phone.clone(),
            process_type: reg.process_type.unwrap_or(ProcessType::Credit),
            status: first_stage.name,
            personal_data,
            second_holder_data: Default::default(),
            financial_data: Default::default(),
            real_estate_data: Default::default(),
            credit_data: Default::default(),
            assigned_consultant_id: None,
            assigned_intermediary_id: None,
            age_under_35,
            priority: false,
            notes: reg.notes,
            tags: vec![],
        })
        .await?;

    state
        .history
        .append(CreateHistoryEntry {
            case_id: case.id,
            author_id: client.id,
            author_name: client.name.clone(),
            action: actions::PUBLIC_REGISTRATION.into(),
            field: None,
            old_value: None,
            new_value: None,
        })
        .await?;

    notify::case_created(&state, &case);

    Ok(Json(json!({
        "success": true,
        "process_id": case.id,
    })))
}
