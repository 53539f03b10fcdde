use crate::auth::handlers::{authenticate, authenticate_admin};
use crate::auth::{email_in_domain, hash_password};
use crate::db::models::User;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub grad_year: i32,
}

pub async fn list_users(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate_admin(&http_req, &state).await?;
    let users = state.db.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Admins may look up anyone; everyone else only themselves.
pub async fn get_user(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let caller = authenticate(&http_req, &state).await?;
    let target_id = path.into_inner();

    if caller.id != target_id && !caller.is_admin() {
        return Err(AuthError::Forbidden.into());
    }

    let user = state
        .db
        .get_user_by_id(target_id)
        .await?
        .ok_or(AppError::DatabaseError(DatabaseError::NotFound))?;
    Ok(HttpResponse::Ok().json(user))
}

/// Direct creation bypasses email verification, so it is admin-only;
/// ordinary accounts arrive via the registration flow.
pub async fn create_user(
    http_req: HttpRequest,
    req: web::Json<CreateUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let admin = authenticate_admin(&http_req, &state).await?;

    validate_new_user(&req)?;
    if !email_in_domain(&req.email, &state.config.auth.allowed_email_domain) {
        return Err(AuthError::EmailDomainNotAllowed.into());
    }
    if state.db.get_user_by_email(&req.email).await?.is_some() {
        return Err(AuthError::EmailAlreadyInUse.into());
    }

    let req = req.into_inner();
    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .create_user(&User::new(req.email, req.name, req.grad_year, password_hash))
        .await?;

    info!("user {} created by admin {}", user.id, admin.id);
    Ok(HttpResponse::Created().json(user))
}

/// Same field bounds as the self-service registration path.
fn validate_new_user(req: &CreateUserRequest) -> Result<(), AppError> {
    if req.email.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "email and name are required".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(AppError::ValidationError(
            "password must be at least 8 characters".into(),
        ));
    }
    if !(2000..=2100).contains(&req.grad_year) {
        return Err(AppError::ValidationError(
            "grad_year must be between 2000 and 2100".into(),
        ));
    }
    Ok(())
}

/// Users may delete their own account; admins may delete anyone's.
/// Sessions and memberships cascade with the row.
pub async fn delete_user(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let caller = authenticate(&http_req, &state).await?;
    let target_id = path.into_inner();

    if caller.id != target_id && !caller.is_admin() {
        return Err(AuthError::Forbidden.into());
    }

    let deleted = state.db.delete_user(target_id).await?;
    if deleted == 0 {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }

    info!("user {} deleted by {}", target_id, caller.id);
    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted" })))
}
