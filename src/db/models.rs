use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "group_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Member,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub grad_year: i32,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String, grad_year: i32, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            grad_year,
            role: UserRole::Member,
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// One session per device; a user may hold several at once.
/// Only token hashes are stored, never the tokens themselves.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    pub access_expires: DateTime<Utc>,
    pub refresh_expires: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    pub fn new(
        user_id: Uuid,
        access_token_hash: String,
        refresh_token_hash: String,
        access_minutes: i64,
        refresh_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            access_token_hash,
            refresh_token_hash,
            access_expires: now + chrono::Duration::minutes(access_minutes),
            refresh_expires: now + chrono::Duration::days(refresh_days),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_access_expired(&self) -> bool {
        Utc::now() > self.access_expires
    }

    pub fn is_refresh_expired(&self) -> bool {
        Utc::now() > self.refresh_expires
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub professor: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(code: String, name: String, professor: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            name,
            professor,
            description,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub course_id: Uuid,
    pub year: i32,
    pub term: String,
    pub contact_details: String,
    pub meeting_day: String,
    pub meeting_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(
        course_id: Uuid,
        year: i32,
        term: String,
        contact_details: String,
        meeting_day: String,
        meeting_time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            year,
            term,
            contact_details,
            meeting_day,
            meeting_time,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserGroup {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub group_role: GroupRole,
    pub created_at: DateTime<Utc>,
}

/// Joined row for the group member listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GroupMember {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub grad_year: i32,
    pub group_role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_member() {
        let user = User::new(
            "gator@ufl.edu".to_string(),
            "Albert".to_string(),
            2027,
            "hash".to_string(),
        );
        assert_eq!(user.role, UserRole::Member);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let user = User::new(
            "gator@ufl.edu".to_string(),
            "Albert".to_string(),
            2027,
            "supersecret".to_string(),
        );
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("supersecret"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("gator@ufl.edu"));
    }

    #[test]
    fn test_session_expiry_windows() {
        let session = UserSession::new(
            Uuid::new_v4(),
            "a".to_string(),
            "r".to_string(),
            15,
            7,
        );
        assert!(!session.is_access_expired());
        assert!(!session.is_refresh_expired());
        assert!(session.access_expires < session.refresh_expires);
    }

    #[test]
    fn test_expired_session() {
        let session = UserSession::new(Uuid::new_v4(), "a".to_string(), "r".to_string(), -1, -1);
        assert!(session.is_access_expired());
        assert!(session.is_refresh_expired());
    }
}
