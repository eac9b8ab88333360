//! Router assembly and server setup.

use std::net::SocketAddr;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{
    admin, auth, cases, documents, health, notifications, public, scheduler, stages, stats,
};
use crate::state::AppState;

/// Build the full `/api` surface.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Open endpoints
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/public/client-registration", post(public::client_registration))
        // Session
        .route("/auth/me", get(auth::me))
        .route("/admin/impersonate/:user_id", post(admin::impersonate))
        .route("/admin/stop-impersonate", post(admin::stop_impersonation))
        // Cases
        .route("/processes", get(cases::list).post(cases::create))
        .route("/processes/:id", get(cases::get).put(cases::update))
        .route("/processes/:id/status", put(cases::change_status))
        .route("/processes/:id/assign", post(cases::assign))
        .route("/processes/:id/alerts", get(cases::case_alerts))
        // Audit trails, addressed by ?process_id=
        .route(
            "/activities",
            get(cases::list_activities).post(cases::add_activity),
        )
        .route("/history", get(cases::list_history))
        // Pipeline registry
        .route(
            "/workflow-statuses",
            get(stages::list).post(stages::create),
        )
        .route("/workflow-statuses/reorder", put(stages::reorder))
        .route(
            "/workflow-statuses/:id",
            put(stages::update).delete(stages::delete),
        )
        // Scheduler
        .route(
            "/deadlines",
            get(scheduler::list_deadlines).post(scheduler::create_deadline),
        )
        .route("/deadlines/calendar", get(scheduler::calendar))
        .route(
            "/deadlines/:id",
            put(scheduler::update_deadline).delete(scheduler::delete_deadline),
        )
        .route("/tasks", get(scheduler::list_tasks).post(scheduler::create_task))
        .route(
            "/tasks/:id",
            put(scheduler::update_task).delete(scheduler::delete_task),
        )
        // Document expiry
        .route(
            "/documents/expiry",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/documents/expiry/upcoming", get(documents::upcoming_documents))
        .route(
            "/documents/expiry/:id",
            put(documents::update_document).delete(documents::delete_document),
        )
        // Inbox
        .route("/alerts/notifications", get(notifications::list_notifications))
        .route(
            "/alerts/notifications/read-all",
            put(notifications::mark_all_read),
        )
        .route("/alerts/notifications/:id/read", put(notifications::mark_read))
        // Users
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/:id",
            put(admin::update_user).delete(admin::deactivate_user),
        )
        // Dashboard
        .route("/stats", get(stats::stats));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// No configured origins means a permissive policy, for local use.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, router).await
}
