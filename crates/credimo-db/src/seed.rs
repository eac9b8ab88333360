//! Idempotent startup seeding.
//!
//! Both seeds are keyed on existing data: the canonical pipeline is
//! inserted only when the stage registry is empty, and the bootstrap
//! admin only when its email is absent. Restarts never duplicate
//! either.

use credimo_core::error::{CredimoError, CredimoResult};
use credimo_core::models::stage::canonical_stages;
use credimo_core::models::user::{CreateUser, Role};
use credimo_core::repository::{StageRepository, UserRepository};
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::repository::{SurrealStageRepository, SurrealUserRepository};

pub const ADMIN_EMAIL: &str = "admin@sistema.pt";
const ADMIN_PASSWORD: &str = "admin2026";

/// Insert the canonical workflow pipeline when the registry is empty.
pub async fn seed_stages<C: Connection>(db: &Surreal<C>) -> CredimoResult<()> {
    let stages = SurrealStageRepository::new(db.clone());

    if stages.count().await? > 0 {
        return Ok(());
    }

    let canonical = canonical_stages();
    let count = canonical.len();
    stages.seed(canonical).await?;
    info!(count, "Seeded canonical workflow stages");

    Ok(())
}

/// Create the bootstrap administrator account when absent.
pub async fn seed_admin<C: Connection>(db: &Surreal<C>) -> CredimoResult<()> {
    let users = SurrealUserRepository::new(db.clone());

    match users.get_by_email(ADMIN_EMAIL).await {
        Ok(_) => return Ok(()),
        Err(CredimoError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    users
        .create(CreateUser {
            email: ADMIN_EMAIL.into(),
            name: "Administrador".into(),
            phone: None,
            role: Role::Admin,
            password: Some(ADMIN_PASSWORD.into()),
            cloud_folder: None,
        })
        .await?;
    info!(email = ADMIN_EMAIL, "Seeded bootstrap administrator");

    Ok(())
}
