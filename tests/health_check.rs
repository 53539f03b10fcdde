use actix_web::{test, web, App};
use chrono::DateTime;
use std::sync::Arc;
use swampstudy_server::{health_check, AppState, DbOperations, Settings};

#[actix_web::test]
async fn test_health_check() {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    let state = web::Data::new(AppState::from_parts(
        config,
        DbOperations::new(Arc::new(pool)),
    ));

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health_check)),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    // lazy pool: present but with zero connections opened
    assert_eq!(json["db_pool"]["total_connections"], 0);
}
