//! User account endpoints.

pub mod handlers;
