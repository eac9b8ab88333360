//! Credimo server — application entry point.
//!
//! Configuration comes from the environment; every variable has a
//! development default so `credimo-server` starts against a local
//! SurrealDB with no setup.

use std::net::SocketAddr;

use credimo_api::{ApiConfig, AppState, SmtpConfig};
use credimo_auth::AuthConfig;
use credimo_db::{DbConfig, DbManager, run_migrations, seed_admin, seed_stages};
use tracing_subscriber::EnvFilter;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn db_config() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env_or("CREDIMO_DB_URL", &defaults.url),
        namespace: env_or("CREDIMO_DB_NAMESPACE", &defaults.namespace),
        database: env_or("CREDIMO_DB_DATABASE", &defaults.database),
        username: env_or("CREDIMO_DB_USERNAME", &defaults.username),
        password: env_or("CREDIMO_DB_PASSWORD", &defaults.password),
    }
}

fn api_config() -> ApiConfig {
    let token_lifetime_hours = env_or("CREDIMO_TOKEN_LIFETIME_HOURS", "24")
        .parse()
        .unwrap_or(24);

    let cors_origins: Vec<String> = env_or("CREDIMO_CORS_ORIGINS", "")
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect();

    // SMTP is optional; without a host the server logs simulated mail.
    let smtp = std::env::var("CREDIMO_SMTP_HOST").ok().map(|host| SmtpConfig {
        host,
        port: env_or("CREDIMO_SMTP_PORT", "587").parse().unwrap_or(587),
        username: env_or("CREDIMO_SMTP_USERNAME", ""),
        password: env_or("CREDIMO_SMTP_PASSWORD", ""),
        from: env_or("CREDIMO_SMTP_FROM", "noreply@credimo.pt"),
    });

    ApiConfig {
        auth: AuthConfig {
            token_secret: env_or("CREDIMO_TOKEN_SECRET", "development-secret"),
            token_lifetime_hours,
        },
        cors_origins,
        smtp,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("credimo=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Credimo server...");

    let db = match DbManager::connect(&db_config()).await {
        Ok(manager) => manager.client(),
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&db).await {
        tracing::error!(error = %e, "Schema migration failed");
        std::process::exit(1);
    }
    if let Err(e) = seed_stages(&db).await {
        tracing::error!(error = %e, "Stage seeding failed");
        std::process::exit(1);
    }
    if let Err(e) = seed_admin(&db).await {
        tracing::error!(error = %e, "Administrator seeding failed");
        std::process::exit(1);
    }

    let addr: SocketAddr = match env_or("CREDIMO_BIND", "0.0.0.0:8080").parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid CREDIMO_BIND address");
            std::process::exit(1);
        }
    };

    let state = AppState::new(db, api_config());
    if let Err(e) = credimo_api::serve(state, addr).await {
        tracing::error!(error = %e, "Server terminated with an error");
        std::process::exit(1);
    }

    tracing::info!("Credimo server stopped.");
}
