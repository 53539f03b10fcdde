//! Persistence layer: row models and the query surface over the
//! Postgres connection pool.

pub mod models;
pub mod operations;

pub use models::{Course, Group, GroupMember, GroupRole, User, UserGroup, UserRole, UserSession};
pub use operations::{DbOperations, DbPoolStatus};
