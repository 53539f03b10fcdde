use crate::auth::pending::PendingVerificationStore;
use crate::auth::tokens::{hash_token, TokenPair};
use crate::db::models::{User, UserSession};
use crate::db::operations::DbOperations;
use crate::email::EmailService;
use crate::error::{AppError, AuthError};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

pub struct AuthService {
    db: DbOperations,
    pending: PendingVerificationStore,
    email: Arc<dyn EmailService>,
    allowed_email_domain: String,
    access_token_minutes: i64,
    refresh_token_days: i64,
}

impl AuthService {
    pub fn new(
        db: DbOperations,
        email: Arc<dyn EmailService>,
        allowed_email_domain: String,
        access_token_minutes: i64,
        refresh_token_days: i64,
        signup_code_ttl_minutes: i64,
    ) -> Self {
        Self {
            db,
            pending: PendingVerificationStore::new(Duration::minutes(signup_code_ttl_minutes)),
            email,
            allowed_email_domain,
            access_token_minutes,
            refresh_token_days,
        }
    }

    fn check_email_domain(&self, email: &str) -> Result<(), AuthError> {
        if email_in_domain(email, &self.allowed_email_domain) {
            Ok(())
        } else {
            Err(AuthError::EmailDomainNotAllowed)
        }
    }

    /// Starts (or restarts) the verification flow for an email that is not
    /// yet a registered user. Re-requests overwrite the earlier code.
    pub async fn request_signup_code(&self, email: &str, name: &str) -> Result<(), AppError> {
        self.check_email_domain(email)?;

        if self.db.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyInUse.into());
        }

        let code = self.pending.upsert(email, name).await;
        self.email.send_verification_code(email, name, &code).await?;

        info!("signup code dispatched to {}", email);
        Ok(())
    }

    /// Completes registration: consumes the pending code, creates the user,
    /// and opens a first session.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        grad_year: i32,
        code: &str,
    ) -> Result<(User, TokenPair), AppError> {
        self.check_email_domain(email)?;

        if self.db.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyInUse.into());
        }

        let pending = self.pending.consume(email, code).await?;

        let password_hash = hash_password(password)?;
        let user = self
            .db
            .create_user(&User::new(
                pending.email,
                pending.name,
                grad_year,
                password_hash,
            ))
            .await?;

        let tokens = self.issue_session(&user).await?;
        info!("registered user {}", user.id);
        Ok((user, tokens))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let user = self
            .db
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.issue_session(&user).await?;
        Ok((user, tokens))
    }

    async fn issue_session(&self, user: &User) -> Result<TokenPair, AppError> {
        let tokens = TokenPair::generate();
        let session = UserSession::new(
            user.id,
            tokens.access_hash(),
            tokens.refresh_hash(),
            self.access_token_minutes,
            self.refresh_token_days,
        );
        self.db.create_session(&session).await?;
        Ok(tokens)
    }

    /// Resolves a presented access token to its user.
    pub async fn verify(&self, access_token: &str) -> Result<User, AppError> {
        let session = self
            .db
            .get_session_by_access_hash(&hash_token(access_token))
            .await?
            .ok_or(AuthError::InvalidOrExpiredAccessToken)?;

        if session.is_access_expired() {
            return Err(AuthError::InvalidOrExpiredAccessToken.into());
        }

        self.db
            .get_user_by_id(session.user_id)
            .await?
            .ok_or_else(|| AuthError::InvalidOrExpiredAccessToken.into())
    }

    /// Rotates the session: a brand-new pair replaces the old one in a single
    /// statement, so a replayed refresh token finds nothing to match.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AppError> {
        let session = self
            .db
            .get_session_by_refresh_hash(&hash_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidOrExpiredRefreshToken)?;

        if session.is_refresh_expired() {
            return Err(AuthError::InvalidOrExpiredRefreshToken.into());
        }

        let tokens = TokenPair::generate();
        let now = chrono::Utc::now();
        self.db
            .rotate_session(
                session.id,
                &tokens.access_hash(),
                &tokens.refresh_hash(),
                now + Duration::minutes(self.access_token_minutes),
                now + Duration::days(self.refresh_token_days),
            )
            .await?;

        let user = self
            .db
            .get_user_by_id(session.user_id)
            .await?
            .ok_or(AuthError::InvalidOrExpiredRefreshToken)?;

        Ok((user, tokens))
    }

    /// Ends the session behind the presented access token.
    pub async fn logout(&self, access_token: &str) -> Result<(), AppError> {
        let deleted = self
            .db
            .delete_session_by_access_hash(&hash_token(access_token))
            .await?;

        if deleted == 0 {
            return Err(AuthError::InvalidOrExpiredAccessToken.into());
        }
        Ok(())
    }

    /// Sign out everywhere: drops every session for the token's user.
    pub async fn logout_all(&self, access_token: &str) -> Result<u64, AppError> {
        let user = self.verify(access_token).await?;
        let deleted = self.db.delete_sessions_for_user(user.id).await?;
        info!("deleted {} sessions for user {}", deleted, user.id);
        Ok(deleted)
    }
}

pub fn email_in_domain(email: &str, domain: &str) -> bool {
    matches!(email.rsplit_once('@'),
        Some((local, d)) if !local.is_empty() && d.eq_ignore_ascii_case(domain))
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_domain_restriction() {
        assert!(email_in_domain("albert@ufl.edu", "ufl.edu"));
        assert!(email_in_domain("albert@UFL.EDU", "ufl.edu"));
        assert!(!email_in_domain("albert@gmail.com", "ufl.edu"));
        assert!(!email_in_domain("albert@sub.ufl.edu", "ufl.edu"));
        assert!(!email_in_domain("@ufl.edu", "ufl.edu"));
        assert!(!email_in_domain("no-at-sign", "ufl.edu"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert_ne!(hash, "hunter2hunter2");
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let h1 = hash_password("hunter2hunter2").unwrap();
        let h2 = hash_password("hunter2hunter2").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
