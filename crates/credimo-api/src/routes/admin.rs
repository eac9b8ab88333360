//! Administration: impersonation and user management.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use credimo_core::models::user::{CreateUser, Role, UpdateUser, User};
use credimo_core::policy::Principal;
use credimo_core::repository::{Pagination, UserRepository};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Auth;
use crate::routes::auth::SessionResponse;
use crate::state::AppState;

fn require_user_admin(principal: &Principal) -> ApiResult<()> {
    if !principal.role.can_manage_users() {
        return Err(ApiError::Forbidden(
            "apenas administradores gerem utilizadores".into(),
        ));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Impersonation
// -----------------------------------------------------------------------

pub async fn impersonate(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let (token, user) = state.auth.impersonate(&principal, user_id).await?;
    Ok(Json(SessionResponse { token, user }))
}

pub async fn stop_impersonation(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> ApiResult<Json<SessionResponse>> {
    let (token, user) = state.auth.stop_impersonation(&principal).await?;
    Ok(Json(SessionResponse { token, user }))
}

// -----------------------------------------------------------------------
// User management
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub role: Option<Role>,
}

fn default_limit() -> u64 {
    50
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub async fn list_users(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserPage>> {
    if !principal.role.can_view_users() {
        return Err(ApiError::Forbidden(
            "sem permissão para consultar utilizadores".into(),
        ));
    }

    // Role filter bypasses pagination: these are short pick lists.
    if let Some(role) = query.role {
        let items = state.users.list_by_role(role).await?;
        let total = items.len() as u64;
        return Ok(Json(UserPage {
            items,
            total,
            offset: 0,
            limit: query.limit,
        }));
    }

    let page = state
        .users
        .list(Pagination {
            offset: query.offset,
            limit: query.limit.clamp(1, 200),
        })
        .await?;
    Ok(Json(UserPage {
        items: page.items,
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub cloud_folder: Option<String>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_user_admin(&principal)?;

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
    if let Some(password) = &req.password {
        if password.len() < 6 {
            return Err(ApiError::Unprocessable(
                "Erro de validação: a palavra-passe deve ter pelo menos 6 caracteres".into(),
            ));
        }
    }

    let user = state
        .users
        .create(CreateUser {
            email: req.email,
            name: req.name,
            phone: req.phone,
            role: req.role,
            password: req.password,
            cloud_folder: req.cloud_folder,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> ApiResult<Json<User>> {
    require_user_admin(&principal)?;

    if let Some(password) = &req.password {
        if password.len() < 6 {
            return Err(ApiError::Unprocessable(
                "Erro de validação: a palavra-passe deve ter pelo menos 6 caracteres".into(),
            ));
        }
    }

    Ok(Json(state.users.update(id, req).await?))
}

/// Soft deactivation; the account stops authenticating but stays
/// referenced by history and assignments.
pub async fn deactivate_user(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_user_admin(&principal)?;

    if id == principal.user_id {
        return Err(ApiError::BadRequest(
            "não é possível desativar a própria conta".into(),
        ));
    }

    state.users.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
