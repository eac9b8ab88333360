//! End-to-end scenarios over the full `/api` surface, backed by an
//! in-memory SurrealDB instance seeded exactly like a fresh install.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use credimo_api::{ApiConfig, AppState, create_router};
use credimo_db::{ADMIN_EMAIL, run_migrations, seed_admin, seed_stages};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup() -> Router {
    let db = surrealdb::engine::any::connect("mem://")
        .await
        .expect("in-memory engine");
    db.use_ns("test").use_db("test").await.expect("ns/db");
    run_migrations(&db).await.expect("migrations");
    seed_stages(&db).await.expect("stage seed");
    seed_admin(&db).await.expect("admin seed");

    create_router(AppState::new(db, ApiConfig::default()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> (String, Value) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    (body["token"].as_str().expect("token").to_owned(), body["user"].clone())
}

async fn admin_login(app: &Router) -> String {
    login(app, ADMIN_EMAIL, "admin2026").await.0
}

/// Create a staff account through the admin API and log it in.
async fn create_and_login(app: &Router, admin: &str, email: &str, role: &str) -> (String, String) {
    let (status, user) = send(
        app,
        "POST",
        "/api/admin/users",
        Some(admin),
        Some(json!({
            "email": email,
            "name": format!("Conta {role}"),
            "role": role,
            "password": "segredo123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "user creation failed: {user}");
    let user_id = user["id"].as_str().expect("user id").to_owned();
    let (token, _) = login(app, email, "segredo123").await;
    (user_id, token)
}

#[tokio::test]
async fn health_reports_alive() {
    let app = setup().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn bootstrap_admin_can_log_in() {
    let app = setup().await;

    let (token, user) = login(&app, ADMIN_EMAIL, "admin2026").await;
    assert_eq!(user["role"], "admin");
    assert_eq!(user["email"], ADMIN_EMAIL);
    assert!(user.get("password_hash").is_none());

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["role"], "admin");
    assert_eq!(me["is_impersonated"], false);
}

#[tokio::test]
async fn public_intake_derives_young_client_alert() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/public/client-registration",
        None,
        Some(json!({
            "name": "João Silva",
            "email": "js@x.pt",
            "phone": "+351 900 000 000",
            "process_type": "credit",
            "personal_data": {"birth_date": "1995-01-15", "nif": "123 456 789"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "intake failed: {body}");
    assert_eq!(body["success"], true);
    let process_id = body["process_id"].as_str().expect("process id").to_owned();

    let admin = admin_login(&app).await;
    let (status, case) = send(
        &app,
        "GET",
        &format!("/api/processes/{process_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(case["age_under_35"], true);
    assert_eq!(case["status"], "em_espera");
    assert_eq!(case["personal_data"]["nif"], "123456789");

    let (status, alerts) = send(
        &app,
        "GET",
        &format!("/api/processes/{process_id}/alerts"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts["total"], 1);
    assert_eq!(alerts["alerts"][0]["type"], "age_under_35");
    assert_eq!(alerts["alerts"][0]["priority"], "info");
    assert_eq!(alerts["has_high"], false);

    // Intake is also recorded in the audit trail.
    let (status, history) = send(
        &app,
        "GET",
        &format!("/api/history?process_id={process_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["action"], "registo_formulario_publico");
}

#[tokio::test]
async fn assignment_bounds_consultant_visibility() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (u_id, u_token) = create_and_login(&app, &admin, "u@credimo.pt", "consultant").await;
    let (_v_id, v_token) = create_and_login(&app, &admin, "v@credimo.pt", "consultant").await;

    let (status, case) = send(
        &app,
        "POST",
        "/api/processes",
        Some(&admin),
        Some(json!({
            "client_name": "Maria Costa",
            "client_email": "maria.costa@example.pt",
            "process_type": "credit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "case creation failed: {case}");
    let case_id = case["id"].as_str().expect("case id").to_owned();

    let (status, assigned) = send(
        &app,
        "POST",
        &format!("/api/processes/{case_id}/assign"),
        Some(&admin),
        Some(json!({"consultant_id": u_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "assignment failed: {assigned}");
    assert_eq!(assigned["assigned_consultant_id"].as_str(), Some(u_id.as_str()));

    let (status, page) = send(&app, "GET", "/api/processes", Some(&u_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"].as_str(), Some(case_id.as_str()));

    let (status, page) = send(&app, "GET", "/api/processes", Some(&v_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);

    // The row outside V's scope answers like a missing one.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/processes/{case_id}"),
        Some(&v_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn credit_data_locked_until_pre_approval() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (w_id, w_token) = create_and_login(&app, &admin, "w@credimo.pt", "intermediary").await;

    let (status, case) = send(
        &app,
        "POST",
        "/api/processes",
        Some(&admin),
        Some(json!({
            "client_name": "Rui Lopes",
            "client_email": "rui.lopes@example.pt",
            "process_type": "credit",
            "assigned_intermediary_id": w_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = case["id"].as_str().expect("case id").to_owned();
    let credit_patch = json!({"credit_data": {"requested_amount": 200000.0, "bank_name": "Banco A"}});

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}"),
        Some(&w_token),
        Some(credit_patch.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["detail"].as_str().unwrap().contains("Autorização bancária"),
        "unexpected detail: {body}"
    );

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}/status"),
        Some(&admin),
        Some(json!({"status": "pre_aprovacao"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, saved) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}"),
        Some(&w_token),
        Some(credit_patch),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "gated update failed: {saved}");
    assert_eq!(saved["credit_data"]["requested_amount"], 200000.0);
    assert!(saved["pre_approval_date"].as_str().is_some());
}

#[tokio::test]
async fn expiring_document_raises_high_alert() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (status, case) = send(
        &app,
        "POST",
        "/api/processes",
        Some(&admin),
        Some(json!({
            "client_name": "Ana Martins",
            "client_email": "ana.martins@example.pt",
            "process_type": "real_estate",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = case["id"].as_str().expect("case id").to_owned();

    let expiry = (Utc::now().date_naive() + Duration::days(15)).to_string();
    let (status, _) = send(
        &app,
        "POST",
        "/api/documents/expiry",
        Some(&admin),
        Some(json!({
            "process_id": case_id,
            "document_type": "cc",
            "document_name": "Cartão de Cidadão",
            "expiry_date": expiry,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, alerts) = send(
        &app,
        "GET",
        &format!("/api/processes/{case_id}/alerts"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts["total"], 1);
    assert_eq!(alerts["alerts"][0]["type"], "document_expiry");
    assert_eq!(alerts["alerts"][0]["priority"], "high");
    assert_eq!(alerts["alerts"][0]["document_name"], "Cartão de Cidadão");
    assert_eq!(alerts["has_high"], true);

    // It also shows up in the cross-case expiry report.
    let (status, upcoming) = send(
        &app,
        "GET",
        "/api/documents/expiry/upcoming",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upcoming.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn impersonation_round_trip() {
    let app = setup().await;
    let (admin, admin_user) = login(&app, ADMIN_EMAIL, "admin2026").await;
    let admin_id = admin_user["id"].as_str().expect("admin id").to_owned();

    let (x_id, _) = create_and_login(&app, &admin, "x@credimo.pt", "consultant").await;

    let (status, session) = send(
        &app,
        "POST",
        &format!("/api/admin/impersonate/{x_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "impersonation failed: {session}");
    assert_eq!(session["user"]["email"], "x@credimo.pt");
    let borrowed = session["token"].as_str().expect("token").to_owned();

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&borrowed), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_impersonated"], true);
    assert_eq!(me["impersonated_by"].as_str(), Some(admin_id.as_str()));

    // The borrowed session carries the consultant's capabilities only.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/admin/impersonate/{x_id}"),
        Some(&borrowed),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, restored) = send(
        &app,
        "POST",
        "/api/admin/stop-impersonate",
        Some(&borrowed),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["user"]["role"], "admin");

    let (status, me) = send(
        &app,
        "GET",
        "/api/auth/me",
        Some(restored["token"].as_str().expect("token")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_impersonated"], false);
    assert!(me.get("impersonated_by").is_none());
}

#[tokio::test]
async fn administrators_cannot_impersonate_each_other() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (other_admin_id, _) = create_and_login(&app, &admin, "admin2@credimo.pt", "admin").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/admin/impersonate/{other_admin_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "unexpected: {body}");
}

#[tokio::test]
async fn update_normalizes_nif_before_saving() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (status, case) = send(
        &app,
        "POST",
        "/api/processes",
        Some(&admin),
        Some(json!({
            "client_name": "Pedro Nunes",
            "client_email": "pedro.nunes@example.pt",
            "process_type": "credit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = case["id"].as_str().expect("case id").to_owned();

    let (status, saved) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}"),
        Some(&admin),
        Some(json!({"personal_data": {"nif": "987 654 321"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update failed: {saved}");
    assert_eq!(saved["personal_data"]["nif"], "987654321");

    let (status, fetched) = send(
        &app,
        "GET",
        &format!("/api/processes/{case_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["personal_data"]["nif"], "987654321");
}

#[tokio::test]
async fn credit_gate_resolves_the_target_stage() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (w_id, w_token) = create_and_login(&app, &admin, "w2@credimo.pt", "intermediary").await;

    let (status, case) = send(
        &app,
        "POST",
        "/api/processes",
        Some(&admin),
        Some(json!({
            "client_name": "Sofia Ramos",
            "client_email": "sofia.ramos@example.pt",
            "process_type": "credit",
            "assigned_intermediary_id": w_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = case["id"].as_str().expect("case id").to_owned();

    // One request moves the case into pre-approval and writes credit
    // data; the gate checks the stage the case lands in.
    let (status, saved) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}"),
        Some(&w_token),
        Some(json!({
            "status": "pre_aprovacao",
            "credit_data": {"approved_amount": 150000.0},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "combined update failed: {saved}");
    assert_eq!(saved["status"], "pre_aprovacao");
    assert_eq!(saved["credit_data"]["approved_amount"], 150000.0);
    assert!(saved["pre_approval_date"].as_str().is_some());

    // Moving back below the gate locks the bag again.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}/status"),
        Some(&admin),
        Some(json!({"status": "em_espera"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/processes/{case_id}"),
        Some(&w_token),
        Some(json!({"credit_data": {"interest_rate": 3.1}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected: {body}");
}

#[tokio::test]
async fn completing_a_deadline_logs_history_once() {
    let app = setup().await;
    let admin = admin_login(&app).await;

    let (status, case) = send(
        &app,
        "POST",
        "/api/processes",
        Some(&admin),
        Some(json!({
            "client_name": "Carlos Pinto",
            "client_email": "carlos.pinto@example.pt",
            "process_type": "credit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let case_id = case["id"].as_str().expect("case id").to_owned();

    let due = (Utc::now().date_naive() + Duration::days(7)).to_string();
    let (status, deadline) = send(
        &app,
        "POST",
        "/api/deadlines",
        Some(&admin),
        Some(json!({
            "case_id": case_id,
            "title": "Entregar documentos ao banco",
            "due_date": due,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "deadline creation failed: {deadline}");
    let deadline_id = deadline["id"].as_str().expect("deadline id").to_owned();

    for _ in 0..2 {
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/deadlines/{deadline_id}"),
            Some(&admin),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "completion failed: {updated}");
        assert_eq!(updated["completed"], true);
    }

    let (status, history) = send(
        &app,
        "GET",
        &format!("/api/history?process_id={case_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let completions = history
        .as_array()
        .expect("history array")
        .iter()
        .filter(|entry| entry["action"] == "prazo_concluido")
        .count();
    assert_eq!(completions, 1, "repeated completion must not log again");
}

#[tokio::test]
async fn repeat_intake_reuses_the_client_account() {
    let app = setup().await;

    let payload = json!({
        "name": "Inês Ferreira",
        "email": "ines.ferreira@example.pt",
        "process_type": "credit",
    });

    let (status, first) = send(
        &app,
        "POST",
        "/api/public/client-registration",
        None,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "first intake failed: {first}");
    let first_id = first["process_id"].as_str().expect("process id").to_owned();

    let (status, second) = send(
        &app,
        "POST",
        "/api/public/client-registration",
        None,
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "second intake failed: {second}");
    let second_id = second["process_id"].as_str().expect("process id").to_owned();
    assert_ne!(first_id, second_id);

    let admin = admin_login(&app).await;
    let (status, page) = send(&app, "GET", "/api/processes", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);

    // Both cases hang off the same client account.
    let (_, a) = send(&app, "GET", &format!("/api/processes/{first_id}"), Some(&admin), None).await;
    let (_, b) = send(&app, "GET", &format!("/api/processes/{second_id}"), Some(&admin), None).await;
    assert_eq!(a["client_id"], b["client_id"]);
    assert!(a["client_id"].as_str().is_some());
}
