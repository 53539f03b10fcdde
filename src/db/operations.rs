use crate::db::models::{Course, Group, GroupMember, GroupRole, User, UserGroup, UserSession};
use crate::error::AppError;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn get_pool_status(&self) -> Result<DbPoolStatus, AppError> {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        let active = size - idle;

        Ok(DbPoolStatus {
            total_connections: size,
            active_connections: active,
            idle_connections: idle,
        })
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        Ok(self.pool.begin().await?)
    }

    // ---- users ----

    pub async fn create_user(&self, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, grad_year, role, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, name, grad_year, role, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.grad_year)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, grad_year, role, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, grad_year, role, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, name, grad_year, role, password_hash, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(users)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    // ---- sessions ----

    pub async fn create_session(&self, session: &UserSession) -> Result<UserSession, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            r#"
            INSERT INTO user_sessions
                (id, user_id, access_token_hash, refresh_token_hash,
                 access_expires, refresh_expires, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.access_token_hash)
        .bind(&session.refresh_token_hash)
        .bind(session.access_expires)
        .bind(session.refresh_expires)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    pub async fn get_session_by_access_hash(
        &self,
        access_token_hash: &str,
    ) -> Result<Option<UserSession>, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            "SELECT * FROM user_sessions WHERE access_token_hash = $1",
        )
        .bind(access_token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    pub async fn get_session_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSession>, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            "SELECT * FROM user_sessions WHERE refresh_token_hash = $1",
        )
        .bind(refresh_token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    /// Replaces both token hashes in one statement, so the old pair is
    /// invalidated atomically with issuing the new one.
    pub async fn rotate_session(
        &self,
        session_id: Uuid,
        access_token_hash: &str,
        refresh_token_hash: &str,
        access_expires: chrono::DateTime<Utc>,
        refresh_expires: chrono::DateTime<Utc>,
    ) -> Result<UserSession, AppError> {
        let session = sqlx::query_as::<_, UserSession>(
            r#"
            UPDATE user_sessions
            SET access_token_hash = $2,
                refresh_token_hash = $3,
                access_expires = $4,
                refresh_expires = $5,
                updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(access_token_hash)
        .bind(refresh_token_hash)
        .bind(access_expires)
        .bind(refresh_expires)
        .bind(Utc::now())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    pub async fn delete_session_by_access_hash(
        &self,
        access_token_hash: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE access_token_hash = $1")
            .bind(access_token_hash)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    /// Reaps sessions whose refresh window has fully lapsed. Sessions with an
    /// expired access token but a live refresh token stay rotatable.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE refresh_expires < $1")
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    // ---- courses ----

    pub async fn create_course(&self, course: &Course) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, code, name, professor, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(course.id)
        .bind(&course.code)
        .bind(&course.name)
        .bind(&course.professor)
        .bind(&course.description)
        .bind(course.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(course)
    }

    pub async fn get_course(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(course)
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY code")
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(courses)
    }

    pub async fn delete_course(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    // ---- groups ----

    /// Creates a group and its owner membership in one transaction; a failure
    /// at any point rolls back, leaving no partial group.
    pub async fn create_group_with_owner(
        &self,
        group: &Group,
        owner_id: Uuid,
    ) -> Result<Group, AppError> {
        let mut transaction = self.begin_transaction().await?;

        let result = async {
            let created = sqlx::query_as::<_, Group>(
                r#"
                INSERT INTO groups
                    (id, course_id, year, term, contact_details, meeting_day, meeting_time, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(group.id)
            .bind(group.course_id)
            .bind(group.year)
            .bind(&group.term)
            .bind(&group.contact_details)
            .bind(&group.meeting_day)
            .bind(group.meeting_time)
            .bind(group.created_at)
            .fetch_one(&mut *transaction)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO user_groups (user_id, group_id, group_role, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(owner_id)
            .bind(group.id)
            .bind(GroupRole::Owner)
            .bind(Utc::now())
            .execute(&mut *transaction)
            .await?;

            Ok::<Group, AppError>(created)
        }
        .await;

        match result {
            Ok(created) => {
                transaction.commit().await?;
                Ok(created)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e)
            }
        }
    }

    pub async fn get_group(&self, id: Uuid) -> Result<Option<Group>, AppError> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(group)
    }

    pub async fn list_groups(&self, course_id: Option<Uuid>) -> Result<Vec<Group>, AppError> {
        let groups = match course_id {
            Some(course_id) => {
                sqlx::query_as::<_, Group>(
                    "SELECT * FROM groups WHERE course_id = $1 ORDER BY created_at",
                )
                .bind(course_id)
                .fetch_all(self.pool.as_ref())
                .await?
            }
            None => {
                sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY created_at")
                    .fetch_all(self.pool.as_ref())
                    .await?
            }
        };

        Ok(groups)
    }

    pub async fn delete_group(&self, id: Uuid) -> Result<u64, AppError> {
        // Memberships go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    // ---- memberships ----

    /// Re-adding an existing (user, group) pair updates the role instead of
    /// erroring.
    pub async fn upsert_membership(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        group_role: GroupRole,
    ) -> Result<UserGroup, AppError> {
        let membership = sqlx::query_as::<_, UserGroup>(
            r#"
            INSERT INTO user_groups (user_id, group_id, group_role, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, group_id)
            DO UPDATE SET group_role = EXCLUDED.group_role
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .bind(group_role)
        .bind(Utc::now())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(membership)
    }

    pub async fn get_membership(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<Option<UserGroup>, AppError> {
        let membership = sqlx::query_as::<_, UserGroup>(
            "SELECT * FROM user_groups WHERE user_id = $1 AND group_id = $2",
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(membership)
    }

    pub async fn delete_membership(&self, user_id: Uuid, group_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_groups WHERE user_id = $1 AND group_id = $2")
            .bind(user_id)
            .bind(group_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_group_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, AppError> {
        let members = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT u.id, u.email, u.name, u.grad_year,
                   ug.group_role, ug.created_at AS joined_at
            FROM user_groups ug
            JOIN users u ON u.id = ug.user_id
            WHERE ug.group_id = $1
            ORDER BY ug.created_at
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(members)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DbPoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}
