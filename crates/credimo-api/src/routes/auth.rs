//! Session endpoints: client self-registration, login and identity.

use axum::Json;
use axum::extract::State;
use credimo_auth::service::RegisterInput;
use credimo_core::models::user::User;
use credimo_core::repository::UserRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Auth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub is_impersonated: bool,
    /// Id of the originating administrator, present only during
    /// impersonation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<Uuid>,
}

fn validate_registration(req: &RegisterRequest) -> ApiResult<()> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "Erro de validação: o nome é obrigatório".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Unprocessable(
            "Erro de validação: email inválido".into(),
        ));
    }
    if req.password.chars().count() < 6 {
        return Err(ApiError::Unprocessable(
            "Erro de validação: a palavra-passe deve ter pelo menos 6 caracteres".into(),
        ));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<SessionResponse>> {
    validate_registration(&req)?;

    let (token, user) = state
        .auth
        .register(RegisterInput {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password: req.password,
        })
        .await?;

    Ok(Json(SessionResponse { token, user }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (token, user) = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(SessionResponse { token, user }))
}

pub async fn me(State(state): State<AppState>, Auth(principal): Auth) -> ApiResult<Json<MeResponse>> {
    let user = state.users.get_by_id(principal.user_id).await?;
    Ok(Json(MeResponse {
        user,
        is_impersonated: principal.impersonated_by.is_some(),
        impersonated_by: principal
            .impersonated_by
            .map(|origin| origin.admin_id),
    }))
}
