//! Bearer-token authentication extractor.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use credimo_core::policy::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, resolved from the `Authorization: Bearer`
/// header on every protected route.
pub struct Auth(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Token de autenticação em falta".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Cabeçalho de autorização inválido".into()))?;

        let principal = state.auth.validate(token).await?;
        Ok(Auth(principal))
    }
}
