//! Course catalog endpoints.

pub mod handlers;
