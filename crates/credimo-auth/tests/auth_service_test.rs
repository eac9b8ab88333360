//! Integration tests for the authentication service over an
//! in-memory SurrealDB user repository.

use credimo_auth::{AuthConfig, AuthService, RegisterInput};
use credimo_core::error::CredimoError;
use credimo_core::models::user::{CreateUser, Role, UpdateUser};
use credimo_core::repository::UserRepository;
use credimo_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

type TestRepo = SurrealUserRepository<surrealdb::engine::local::Db>;

async fn setup() -> (AuthService<TestRepo>, TestRepo) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    credimo_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db);
    let config = AuthConfig {
        token_secret: "segredo-de-teste".into(),
        token_lifetime_hours: 1,
    };
    (AuthService::new(users.clone(), config), users)
}

async fn create_staff(users: &TestRepo, email: &str, role: Role) -> credimo_core::models::user::User {
    users
        .create(CreateUser {
            email: email.into(),
            name: "Membro da Equipa".into(),
            phone: None,
            role,
            password: Some("palavra-passe".into()),
            cloud_folder: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn register_creates_client_and_issues_token() {
    let (auth, _) = setup().await;

    let (token, user) = auth
        .register(RegisterInput {
            name: "João Silva".into(),
            email: "Joao@Example.com".into(),
            phone: None,
            password: "segredo123".into(),
        })
        .await
        .unwrap();

    assert_eq!(user.role, Role::Client);
    assert_eq!(user.email, "joao@example.com");

    let principal = auth.validate(&token).await.unwrap();
    assert_eq!(principal.user_id, user.id);
    assert!(principal.impersonated_by.is_none());
}

#[tokio::test]
async fn login_round_trip() {
    let (auth, users) = setup().await;
    let user = create_staff(&users, "ana@credimo.pt", Role::Consultant).await;

    let (token, logged) = auth.login("ana@credimo.pt", "palavra-passe").await.unwrap();
    assert_eq!(logged.id, user.id);

    let principal = auth.validate(&token).await.unwrap();
    assert_eq!(principal.role, Role::Consultant);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let (auth, users) = setup().await;
    create_staff(&users, "ana@credimo.pt", Role::Consultant).await;

    // No password set at all.
    users
        .create(CreateUser {
            email: "cliente@example.com".into(),
            name: "Cliente".into(),
            phone: None,
            role: Role::Client,
            password: None,
            cloud_folder: None,
        })
        .await
        .unwrap();

    for (email, password) in [
        ("desconhecido@example.com", "qualquer"),
        ("ana@credimo.pt", "errada"),
        ("cliente@example.com", "qualquer"),
    ] {
        let err = auth.login(email, password).await.unwrap_err();
        assert!(
            matches!(err, CredimoError::InvalidCredentials),
            "expected uniform failure for {email}"
        );
    }
}

#[tokio::test]
async fn deactivated_account_cannot_login_or_validate() {
    let (auth, users) = setup().await;
    let user = create_staff(&users, "ana@credimo.pt", Role::Consultant).await;

    let (token, _) = auth.login("ana@credimo.pt", "palavra-passe").await.unwrap();

    users
        .update(
            user.id,
            UpdateUser {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = auth.login("ana@credimo.pt", "palavra-passe").await.unwrap_err();
    assert!(matches!(err, CredimoError::InvalidCredentials));

    // A previously issued token dies with the account.
    let err = auth.validate(&token).await.unwrap_err();
    assert!(matches!(err, CredimoError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn impersonation_round_trip() {
    let (auth, users) = setup().await;
    let admin = create_staff(&users, "admin@credimo.pt", Role::Admin).await;
    let consultant = create_staff(&users, "ana@credimo.pt", Role::Consultant).await;

    let (admin_token, _) = auth.login("admin@credimo.pt", "palavra-passe").await.unwrap();
    let admin_principal = auth.validate(&admin_token).await.unwrap();

    let (imp_token, target) = auth
        .impersonate(&admin_principal, consultant.id)
        .await
        .unwrap();
    assert_eq!(target.id, consultant.id);

    let imp_principal = auth.validate(&imp_token).await.unwrap();
    assert_eq!(imp_principal.user_id, consultant.id);
    assert_eq!(imp_principal.role, Role::Consultant);
    let origin = imp_principal.impersonated_by.as_ref().unwrap();
    assert_eq!(origin.admin_id, admin.id);

    // Nested impersonation is denied.
    let err = auth
        .impersonate(&imp_principal, consultant.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CredimoError::AuthorizationDenied { .. }));

    let (restored_token, restored) = auth.stop_impersonation(&imp_principal).await.unwrap();
    assert_eq!(restored.id, admin.id);
    let restored_principal = auth.validate(&restored_token).await.unwrap();
    assert!(restored_principal.impersonated_by.is_none());
}

#[tokio::test]
async fn admin_cannot_impersonate_admin_and_staff_cannot_impersonate() {
    let (auth, users) = setup().await;
    create_staff(&users, "admin@credimo.pt", Role::Admin).await;
    let other_admin = create_staff(&users, "admin2@credimo.pt", Role::Admin).await;
    let consultant = create_staff(&users, "ana@credimo.pt", Role::Consultant).await;

    let (admin_token, _) = auth.login("admin@credimo.pt", "palavra-passe").await.unwrap();
    let admin_principal = auth.validate(&admin_token).await.unwrap();

    let err = auth
        .impersonate(&admin_principal, other_admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CredimoError::AuthorizationDenied { .. }));

    let (staff_token, _) = auth.login("ana@credimo.pt", "palavra-passe").await.unwrap();
    let staff_principal = auth.validate(&staff_token).await.unwrap();
    let err = auth
        .impersonate(&staff_principal, consultant.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CredimoError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn stop_impersonation_requires_impersonated_session() {
    let (auth, users) = setup().await;
    create_staff(&users, "admin@credimo.pt", Role::Admin).await;

    let (token, _) = auth.login("admin@credimo.pt", "palavra-passe").await.unwrap();
    let principal = auth.validate(&token).await.unwrap();

    let err = auth.stop_impersonation(&principal).await.unwrap_err();
    assert!(matches!(err, CredimoError::Validation { .. }));
}
