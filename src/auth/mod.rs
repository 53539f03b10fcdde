//! Authentication: opaque token pairs, session lifecycle, the email
//! verification flow, and the signup rate limiter.

pub mod handlers;
mod pending;
mod rate_limit;
mod service;
mod tokens;

pub use pending::{generate_code, PendingVerification, PendingVerificationStore};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use service::{email_in_domain, hash_password, verify_password, AuthService};
pub use tokens::{generate_token, hash_token, TokenPair};
