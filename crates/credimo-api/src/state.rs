//! Shared application state and runtime configuration.

use std::sync::Arc;

use credimo_auth::{AuthConfig, AuthService};
use credimo_db::repository::{
    SurrealActivityRepository, SurrealCaseRepository, SurrealDeadlineRepository,
    SurrealDocumentExpiryRepository, SurrealHistoryRepository, SurrealNotificationRepository,
    SurrealStageRepository, SurrealTaskRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

/// SMTP relay settings. When absent, outgoing mail is simulated and
/// logged instead of sent.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// API runtime configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub auth: AuthConfig,
    /// Allowed CORS origins; empty means same-origin only.
    pub cors_origins: Vec<String>,
    pub smtp: Option<SmtpConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            cors_origins: vec![],
            smtp: None,
        }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: SurrealUserRepository<Any>,
    pub stages: SurrealStageRepository<Any>,
    pub cases: SurrealCaseRepository<Any>,
    pub activities: SurrealActivityRepository<Any>,
    pub history: SurrealHistoryRepository<Any>,
    pub deadlines: SurrealDeadlineRepository<Any>,
    pub tasks: SurrealTaskRepository<Any>,
    pub documents: SurrealDocumentExpiryRepository<Any>,
    pub notifications: SurrealNotificationRepository<Any>,
    pub auth: Arc<AuthService<SurrealUserRepository<Any>>>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, config: ApiConfig) -> Self {
        let users = SurrealUserRepository::new(db.clone());
        let auth = Arc::new(AuthService::new(users.clone(), config.auth.clone()));
        Self {
            users,
            stages: SurrealStageRepository::new(db.clone()),
            cases: SurrealCaseRepository::new(db.clone()),
            activities: SurrealActivityRepository::new(db.clone()),
            history: SurrealHistoryRepository::new(db.clone()),
            deadlines: SurrealDeadlineRepository::new(db.clone()),
            tasks: SurrealTaskRepository::new(db.clone()),
            documents: SurrealDocumentExpiryRepository::new(db.clone()),
            notifications: SurrealNotificationRepository::new(db),
            auth,
            config: Arc::new(config),
        }
    }
}
