//! Study group endpoints and membership authorization.
//!
//! Every mutating endpoint re-derives authorization from the stored
//! `user_groups` rows; client-supplied role claims are never trusted.

pub mod handlers;
