use crate::auth::handlers::{authenticate, authenticate_admin};
use crate::db::models::Course;
use crate::error::{AppError, DatabaseError};
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub code: String,
    pub name: String,
    pub professor: String,
    pub description: Option<String>,
}

pub async fn list_courses(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate(&http_req, &state).await?;
    let courses = state.db.list_courses().await?;
    Ok(HttpResponse::Ok().json(courses))
}

pub async fn get_course(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate(&http_req, &state).await?;
    let course = state
        .db
        .get_course(path.into_inner())
        .await?
        .ok_or(AppError::DatabaseError(DatabaseError::NotFound))?;
    Ok(HttpResponse::Ok().json(course))
}

/// Any authenticated user may add a course to the catalog.
pub async fn create_course(
    http_req: HttpRequest,
    req: web::Json<CreateCourseRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&http_req, &state).await?;

    if req.code.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "code and name are required".into(),
        ));
    }

    let req = req.into_inner();
    let course = state
        .db
        .create_course(&Course::new(
            req.code,
            req.name,
            req.professor,
            req.description,
        ))
        .await?;

    info!("course {} created by user {}", course.id, user.id);
    Ok(HttpResponse::Created().json(course))
}

/// Courses are owned by no one; only admins may remove them.
pub async fn delete_course(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate_admin(&http_req, &state).await?;

    let deleted = state.db.delete_course(path.into_inner()).await?;
    if deleted == 0 {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Course deleted" })))
}
