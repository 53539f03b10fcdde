use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;
use swampstudy_server::auth::handlers::{
    login, logout, refresh, register, request_signup_code, verify,
};
use swampstudy_server::{AppState, DbOperations, Settings};

/// State over a lazy pool: no database is reached until a handler actually
/// runs a query, which lets the pre-database paths be exercised hermetically.
fn test_state(mutate: impl FnOnce(&mut Settings)) -> web::Data<AppState> {
    let mut config = Settings::new_for_test().expect("Failed to load test config");
    mutate(&mut config);

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");

    web::Data::new(AppState::from_parts(config, DbOperations::new(Arc::new(pool))))
}

macro_rules! auth_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .route("/api/auth/request-signup-code", web::post().to(request_signup_code))
                .route("/api/auth/register", web::post().to(register))
                .route("/api/auth/login", web::post().to(login))
                .route("/api/auth/verify", web::get().to(verify))
                .route("/api/auth/refresh", web::post().to(refresh))
                .route("/api/auth/logout", web::post().to(logout)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_verify_without_cookie_is_unauthorized() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    let resp = test::TestRequest::get()
        .uri("/api/auth/verify")
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_refresh_without_cookie_is_unauthorized() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_logout_without_cookie_is_unauthorized() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/api/auth/logout")
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_signup_code_rejects_foreign_domain() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/api/auth/request-signup-code")
        .set_json(json!({ "email": "albert@gmail.com", "name": "Albert" }))
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_signup_code_rejects_empty_fields() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/api/auth/request-signup-code")
        .set_json(json!({ "email": "", "name": "" }))
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_signup_code_rate_limited_with_time_remaining() {
    // One request allowed per window; the second is denied before any
    // validation runs
    let state = test_state(|config| {
        config.rate_limit.max_requests = 1;
    });
    let app = auth_app!(state);

    let first = test::TestRequest::post()
        .uri("/api/auth/request-signup-code")
        .set_json(json!({ "email": "albert@gmail.com", "name": "Albert" }))
        .send_request(&app)
        .await;
    assert_eq!(first.status(), 400);

    let second = test::TestRequest::post()
        .uri("/api/auth/request-signup-code")
        .set_json(json!({ "email": "albert@gmail.com", "name": "Albert" }))
        .send_request(&app)
        .await;
    assert_eq!(second.status(), 429);

    let body: serde_json::Value = test::read_body_json(second).await;
    let remaining = body["error"]["timeRemaining"].as_i64().unwrap();
    assert!(remaining > 0);
}

#[actix_web::test]
async fn test_register_validation_errors() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    // short password
    let resp = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": "albert@ufl.edu",
            "name": "Albert",
            "password": "short",
            "grad_year": 2027,
            "code": "123456"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);

    // malformed code
    let resp = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": "albert@ufl.edu",
            "name": "Albert",
            "password": "longenough",
            "grad_year": 2027,
            "code": "12ab"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);

    // implausible grad year
    let resp = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": "albert@ufl.edu",
            "name": "Albert",
            "password": "longenough",
            "grad_year": 1895,
            "code": "123456"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_register_unknown_pending_verification() {
    let state = test_state(|_| {});
    let app = auth_app!(state);

    // Valid shape, foreign domain: rejected before the pending-store lookup
    let resp = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": "albert@gmail.com",
            "name": "Albert",
            "password": "longenough",
            "grad_year": 2027,
            "code": "123456"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}
