//! Authentication service — registration, login, token validation and
//! impersonation orchestration.

use credimo_core::error::{CredimoError, CredimoResult};
use credimo_core::models::user::{CreateUser, Role, User};
use credimo_core::policy::{Impersonator, Principal};
use credimo_core::repository::UserRepository;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for self-service client registration.
#[derive(Debug)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Authentication service.
///
/// Generic over the user repository so the auth layer has no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    users: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: U, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Create a new CLIENT account and return a session token.
    /// Duplicate email is rejected by the repository.
    pub async fn register(&self, input: RegisterInput) -> CredimoResult<(String, User)> {
        let user = self
            .users
            .create(CreateUser {
                email: input.email.trim().to_lowercase(),
                name: input.name,
                phone: input.phone,
                role: Role::Client,
                password: Some(input.password),
                cloud_folder: None,
            })
            .await?;

        let token = token::issue_token(user.id, &user.email, user.role, None, &self.config)?;
        Ok((token, user))
    }

    /// Authenticate with email + password.
    ///
    /// Unknown email, wrong password, missing hash and inactive
    /// account all fail with the same uniform error; the missing-hash
    /// and unknown-email paths still burn one Argon2 verification.
    pub async fn login(&self, email: &str, raw_password: &str) -> CredimoResult<(String, User)> {
        let user = match self.users.get_by_email(&email.trim().to_lowercase()).await {
            Ok(u) => u,
            Err(CredimoError::NotFound { .. }) => {
                password::verify_dummy(raw_password);
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = match &user.password_hash {
            Some(hash) => password::verify_password(raw_password, hash)
                .map_err(|e| CredimoError::Crypto(e.to_string()))?,
            None => {
                password::verify_dummy(raw_password);
                false
            }
        };

        if !valid || !user.active {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = token::issue_token(user.id, &user.email, user.role, None, &self.config)?;
        Ok((token, user))
    }

    /// Validate a bearer token and resolve the acting principal.
    /// Deactivated accounts are denied even with a live token.
    pub async fn validate(&self, raw_token: &str) -> CredimoResult<Principal> {
        let claims = token::decode_token(raw_token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("sujeito inválido: {e}")))?;

        let user = self.users.get_by_id(user_id).await.map_err(|e| match e {
            CredimoError::NotFound { .. } => {
                AuthError::TokenInvalid("utilizador desconhecido".into()).into()
            }
            other => other,
        })?;

        if !user.active {
            return Err(CredimoError::AuthenticationFailed {
                reason: "conta desativada".into(),
            });
        }

        let impersonated_by = match (claims.impersonated_by, claims.impersonated_by_name) {
            (Some(id), name) => Some(Impersonator {
                admin_id: Uuid::parse_str(&id)
                    .map_err(|e| AuthError::TokenInvalid(format!("impersonated_by: {e}")))?,
                admin_name: name.unwrap_or_default(),
            }),
            (None, _) => None,
        };

        Ok(Principal {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            impersonated_by,
        })
    }

    /// Issue a token whose subject is `target_user_id` but which
    /// carries the admin's identity as impersonation metadata.
    ///
    /// Admins only; another admin cannot be targeted, and a session
    /// that is already impersonating cannot impersonate again.
    pub async fn impersonate(
        &self,
        principal: &Principal,
        target_user_id: Uuid,
    ) -> CredimoResult<(String, User)> {
        if !principal.role.can_impersonate() || principal.impersonated_by.is_some() {
            return Err(CredimoError::forbidden(
                "apenas administradores podem personificar utilizadores",
            ));
        }

        let target = self.users.get_by_id(target_user_id).await?;
        if target.role == Role::Admin {
            return Err(CredimoError::forbidden(
                "não é possível personificar outro administrador",
            ));
        }

        let token = token::issue_token(
            target.id,
            &target.email,
            target.role,
            Some((principal.user_id, &principal.name)),
            &self.config,
        )?;
        Ok((token, target))
    }

    /// Return a fresh non-impersonated token for the originating
    /// admin.
    pub async fn stop_impersonation(&self, principal: &Principal) -> CredimoResult<(String, User)> {
        let origin = principal.impersonated_by.as_ref().ok_or_else(|| {
            CredimoError::validation("a sessão atual não é uma personificação")
        })?;

        let admin = self.users.get_by_id(origin.admin_id).await?;
        let token = token::issue_token(admin.id, &admin.email, admin.role, None, &self.config)?;
        Ok((token, admin))
    }
}
