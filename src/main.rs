use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use swampstudy_server::auth::handlers::{
    login, logout, logout_all, refresh, register, request_signup_code, verify,
};
use swampstudy_server::courses::handlers::{
    create_course, delete_course, get_course, list_courses,
};
use swampstudy_server::groups::handlers::{
    add_member, create_group, delete_group, get_group, list_groups, list_members, remove_member,
};
use swampstudy_server::users::handlers::{create_user, delete_user, get_user, list_users};
use swampstudy_server::{health_check, AppError, AppState, Settings};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> swampstudy_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!(
        "Starting server at {}:{}",
        config.server.host, config.server.port
    );

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Reap sessions whose refresh window has fully expired
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        loop {
            match cleanup_state.db.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => info!("reaped {} expired sessions", n),
                Err(e) => error!("session cleanup failed: {}", e),
            }
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if config.cors.enabled {
            let cors_config = Cors::default();

            let cors_config = if config.cors.allow_any_origin {
                cors_config
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .expose_any_header()
            } else {
                // The SPA dev server and production origin; cookies require
                // credential support
                cors_config
                    .allowed_origin("https://swampstudy.app")
                    .allowed_origin("http://localhost:3000")
                    .allowed_origin("http://127.0.0.1:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec!["Content-Type"])
                    .supports_credentials()
            };

            cors_config.max_age(config.cors.max_age as usize)
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/request-signup-code", web::post().to(request_signup_code))
                            .route("/register", web::post().to(register))
                            .route("/login", web::post().to(login))
                            .route("/verify", web::get().to(verify))
                            .route("/refresh", web::post().to(refresh))
                            .route("/logout", web::post().to(logout))
                            .route("/logout-all", web::post().to(logout_all)),
                    )
                    .service(
                        web::scope("/course")
                            .route("", web::get().to(list_courses))
                            .route("", web::post().to(create_course))
                            .route("/{id}", web::get().to(get_course))
                            .route("/{id}", web::delete().to(delete_course)),
                    )
                    .service(
                        web::scope("/group")
                            .route("", web::get().to(list_groups))
                            .route("", web::post().to(create_group))
                            .route("/{id}", web::get().to(get_group))
                            .route("/{id}", web::delete().to(delete_group))
                            .route("/{id}/users", web::get().to(list_members))
                            .route("/{group_id}/user/{user_id}", web::put().to(add_member))
                            .route(
                                "/{group_id}/user/{user_id}",
                                web::delete().to(remove_member),
                            ),
                    )
                    .service(
                        web::scope("/user")
                            .route("", web::get().to(list_users))
                            .route("", web::post().to(create_user))
                            .route("/{id}", web::get().to(get_user))
                            .route("/{id}", web::delete().to(delete_user)),
                    ),
            )
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
