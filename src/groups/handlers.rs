use crate::auth::handlers::authenticate;
use crate::db::models::{Group, GroupRole, User};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveTime;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub course_id: Uuid,
    pub year: i32,
    pub term: String,
    pub contact_details: String,
    pub meeting_day: String,
    pub meeting_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct ListGroupsQuery {
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    #[serde(default = "default_member_role")]
    pub group_role: GroupRole,
}

fn default_member_role() -> GroupRole {
    GroupRole::Member
}

/// True when `user` currently owns `group_id`, derived from the stored rows.
async fn is_group_owner(state: &AppState, user: &User, group_id: Uuid) -> Result<bool, AppError> {
    Ok(state
        .db
        .get_membership(user.id, group_id)
        .await?
        .map(|m| m.group_role == GroupRole::Owner)
        .unwrap_or(false))
}

pub async fn list_groups(
    http_req: HttpRequest,
    query: web::Query<ListGroupsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate(&http_req, &state).await?;
    let groups = state.db.list_groups(query.course_id).await?;
    Ok(HttpResponse::Ok().json(groups))
}

pub async fn get_group(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate(&http_req, &state).await?;
    let group = state
        .db
        .get_group(path.into_inner())
        .await?
        .ok_or(AppError::DatabaseError(DatabaseError::NotFound))?;
    Ok(HttpResponse::Ok().json(group))
}

/// Creates the group and its owner membership in one transaction; the
/// caller becomes the owner.
pub async fn create_group(
    http_req: HttpRequest,
    req: web::Json<CreateGroupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&http_req, &state).await?;

    if state.db.get_course(req.course_id).await?.is_none() {
        return Err(AppError::ValidationError("course does not exist".into()));
    }

    let req = req.into_inner();
    let group = state
        .db
        .create_group_with_owner(
            &Group::new(
                req.course_id,
                req.year,
                req.term,
                req.contact_details,
                req.meeting_day,
                req.meeting_time,
            ),
            user.id,
        )
        .await?;

    info!("group {} created by user {}", group.id, user.id);
    Ok(HttpResponse::Created().json(group))
}

/// Deleting a group requires admin or the group's current owner.
pub async fn delete_group(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&http_req, &state).await?;
    let group_id = path.into_inner();

    if !user.is_admin() && !is_group_owner(&state, &user, group_id).await? {
        return Err(AuthError::Forbidden.into());
    }

    let deleted = state.db.delete_group(group_id).await?;
    if deleted == 0 {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }

    info!("group {} deleted by user {}", group_id, user.id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Group deleted" })))
}

/// Adds (or re-roles, via upsert) a membership.
///
/// Rules: granting the owner role requires admin; users may add themselves
/// as member; adding anyone else requires admin or the group's owner.
pub async fn add_member(
    http_req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<AddMemberRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let caller = authenticate(&http_req, &state).await?;
    let (group_id, target_user_id) = path.into_inner();

    if state.db.get_group(group_id).await?.is_none() {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }
    if state.db.get_user_by_id(target_user_id).await?.is_none() {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }

    if req.group_role == GroupRole::Owner && !caller.is_admin() {
        return Err(AuthError::Forbidden.into());
    }

    let adding_self = caller.id == target_user_id;
    if !adding_self && !caller.is_admin() && !is_group_owner(&state, &caller, group_id).await? {
        return Err(AuthError::Forbidden.into());
    }

    let membership = state
        .db
        .upsert_membership(target_user_id, group_id, req.group_role)
        .await?;

    info!(
        "user {} added to group {} as {:?} by {}",
        target_user_id, group_id, membership.group_role, caller.id
    );
    Ok(HttpResponse::Ok().json(membership))
}

/// Removing a member requires admin, the group's owner, or the member
/// themselves.
pub async fn remove_member(
    http_req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let caller = authenticate(&http_req, &state).await?;
    let (group_id, target_user_id) = path.into_inner();

    let removing_self = caller.id == target_user_id;
    if !removing_self && !caller.is_admin() && !is_group_owner(&state, &caller, group_id).await? {
        return Err(AuthError::Forbidden.into());
    }

    let deleted = state.db.delete_membership(target_user_id, group_id).await?;
    if deleted == 0 {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }

    info!(
        "user {} removed from group {} by {}",
        target_user_id, group_id, caller.id
    );
    Ok(HttpResponse::Ok().json(json!({ "message": "Member removed" })))
}

pub async fn list_members(
    http_req: HttpRequest,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authenticate(&http_req, &state).await?;
    let group_id = path.into_inner();

    if state.db.get_group(group_id).await?.is_none() {
        return Err(AppError::DatabaseError(DatabaseError::NotFound));
    }

    let members = state.db.list_group_members(group_id).await?;
    Ok(HttpResponse::Ok().json(members))
}
