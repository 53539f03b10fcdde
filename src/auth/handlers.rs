use crate::auth::tokens::TokenPair;
use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Deserialize)]
pub struct SignupCodeRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub grad_year: i32,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Client IP used as the rate-limit key; honors X-Forwarded-For when behind
/// a proxy via actix's connection info.
pub fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

fn cookie_value(req: &HttpRequest, name: &str, missing: AuthError) -> Result<String, AppError> {
    req.cookie(name)
        .map(|c| c.value().to_string())
        .ok_or_else(|| missing.into())
}

pub fn access_token(req: &HttpRequest) -> Result<String, AppError> {
    cookie_value(req, ACCESS_COOKIE, AuthError::AccessTokenMissing)
}

pub fn refresh_token(req: &HttpRequest) -> Result<String, AppError> {
    cookie_value(req, REFRESH_COOKIE, AuthError::RefreshTokenMissing)
}

/// Resolves the current user from the access-token cookie.
pub async fn authenticate(req: &HttpRequest, state: &AppState) -> Result<User, AppError> {
    let token = access_token(req)?;
    state.auth.verify(&token).await
}

/// Same, but additionally requires the admin role.
pub async fn authenticate_admin(req: &HttpRequest, state: &AppState) -> Result<User, AppError> {
    let user = authenticate(req, state).await?;
    if !user.is_admin() {
        return Err(AuthError::Forbidden.into());
    }
    Ok(user)
}

fn session_cookie(name: &'static str, value: String, max_age: CookieDuration) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .finish()
}

fn attach_session_cookies(
    mut builder: actix_web::HttpResponseBuilder,
    tokens: &TokenPair,
    state: &AppState,
) -> actix_web::HttpResponseBuilder {
    builder.cookie(session_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        CookieDuration::minutes(state.config.auth.access_token_minutes),
    ));
    builder.cookie(session_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        CookieDuration::days(state.config.auth.refresh_token_days),
    ));
    builder
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path("/").finish();
    cookie.make_removal();
    cookie
}

pub async fn request_signup_code(
    http_req: HttpRequest,
    req: web::Json<SignupCodeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.check(&client_ip(&http_req)).await?;

    if req.email.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "email and name are required".into(),
        ));
    }

    match state.auth.request_signup_code(&req.email, &req.name).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "Verification code sent"
        }))),
        Err(e) => {
            error!("signup code request failed for {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn register(
    http_req: HttpRequest,
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.rate_limiter.check(&client_ip(&http_req)).await?;
    validate_registration(&req)?;

    match state
        .auth
        .register(
            &req.email,
            &req.name,
            &req.password,
            req.grad_year,
            &req.code,
        )
        .await
    {
        Ok((user, tokens)) => {
            info!("registration successful for {}", req.email);
            Ok(attach_session_cookies(HttpResponse::Created(), &tokens, &state).json(user))
        }
        Err(e) => {
            error!("registration failed for {}: {}", req.email, e);
            Err(e)
        }
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
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
    if req.code.len() != 6 || !req.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "code must be exactly 6 digits".into(),
        ));
    }
    Ok(())
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    match state.auth.login(&req.email, &req.password).await {
        Ok((_user, tokens)) => {
            info!("login successful for {}", req.email);
            Ok(
                attach_session_cookies(HttpResponse::Ok(), &tokens, &state).json(json!({
                    "message": "Logged in"
                })),
            )
        }
        Err(e) => {
            error!("login failed for {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn verify(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticate(&http_req, &state).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

pub async fn refresh(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = refresh_token(&http_req)?;
    let (user, tokens) = state.auth.refresh(&token).await?;
    Ok(
        attach_session_cookies(HttpResponse::Ok(), &tokens, &state).json(json!({
            "status": "ok",
            "data": user
        })),
    )
}

pub async fn logout(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = access_token(&http_req)?;
    state.auth.logout(&token).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_COOKIE))
        .cookie(removal_cookie(REFRESH_COOKIE))
        .json(json!({ "message": "Logged out" })))
}

pub async fn logout_all(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = access_token(&http_req)?;
    let deleted = state.auth.logout_all(&token).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_COOKIE))
        .cookie(removal_cookie(REFRESH_COOKIE))
        .json(json!({
            "message": "Logged out everywhere",
            "sessions_ended": deleted
        })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            email: "albert@ufl.edu".into(),
            name: "Albert".into(),
            password: "longenough".into(),
            grad_year: 2027,
            code: "123456".into(),
        }
    }

    #[test]
    fn test_validate_registration_accepts_valid() {
        assert!(validate_registration(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_registration_rejects_short_password() {
        let mut req = valid_request();
        req.password = "short".into();
        assert!(matches!(
            validate_registration(&req),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_registration_rejects_bad_grad_year() {
        let mut req = valid_request();
        req.grad_year = 1995;
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_validate_registration_rejects_bad_code() {
        let mut req = valid_request();
        req.code = "12345".into();
        assert!(validate_registration(&req).is_err());

        req.code = "12345a".into();
        assert!(validate_registration(&req).is_err());
    }
}
