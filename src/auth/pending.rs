use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Temporary record linking an email to a one-time signup code before a
/// User row exists.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    pub email: String,
    pub name: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

pub fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// In-memory store of pending email verifications, at most one per email.
pub struct PendingVerificationStore {
    entries: Arc<RwLock<HashMap<String, PendingVerification>>>,
    ttl: Duration,
}

impl PendingVerificationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Creates or overwrites the pending record for `email`, returning the
    /// fresh code. A re-request invalidates any earlier code.
    pub async fn upsert(&self, email: &str, name: &str) -> String {
        let code = generate_code();
        let record = PendingVerification {
            email: email.to_string(),
            name: name.to_string(),
            code: code.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        self.entries
            .write()
            .await
            .insert(email.to_string(), record);

        code
    }

    /// Validates and consumes the code for `email`. A wrong or expired code
    /// leaves the record in place so the user can retry; a match removes it.
    pub async fn consume(&self, email: &str, code: &str) -> Result<PendingVerification, AuthError> {
        let mut entries = self.entries.write().await;

        let record = entries
            .get(email)
            .ok_or(AuthError::PendingVerificationNotFound)?;

        if record.code != code {
            return Err(AuthError::InvalidPasscode);
        }

        if record.is_expired() {
            return Err(AuthError::PasscodeExpired);
        }

        // Match: the record is consumed exactly once.
        Ok(entries.remove(email).expect("entry present under lock"))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PendingVerificationStore {
        PendingVerificationStore::new(Duration::minutes(10))
    }

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_single_entry() {
        let store = store();
        let first = store.upsert("a@ufl.edu", "Albert").await;
        let second = store.upsert("a@ufl.edu", "Albert").await;

        assert_eq!(store.len().await, 1);

        // the earlier code no longer works
        if first != second {
            assert!(matches!(
                store.consume("a@ufl.edu", &first).await,
                Err(AuthError::InvalidPasscode)
            ));
        }
        assert!(store.consume("a@ufl.edu", &second).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let store = store();
        assert!(matches!(
            store.consume("nobody@ufl.edu", "123456").await,
            Err(AuthError::PendingVerificationNotFound)
        ));
    }

    #[tokio::test]
    async fn test_wrong_code_retains_record_for_retry() {
        let store = store();
        let code = store.upsert("a@ufl.edu", "Albert").await;

        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(matches!(
            store.consume("a@ufl.edu", wrong).await,
            Err(AuthError::InvalidPasscode)
        ));

        // record survived; the right code still works
        assert!(store.consume("a@ufl.edu", &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_code_retains_record() {
        let store = PendingVerificationStore::new(Duration::minutes(-1));
        let code = store.upsert("a@ufl.edu", "Albert").await;

        assert!(matches!(
            store.consume("a@ufl.edu", &code).await,
            Err(AuthError::PasscodeExpired)
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_successful_consume_removes_exactly_once() {
        let store = store();
        let code = store.upsert("a@ufl.edu", "Albert").await;

        let record = store.consume("a@ufl.edu", &code).await.unwrap();
        assert_eq!(record.email, "a@ufl.edu");
        assert_eq!(record.name, "Albert");
        assert!(store.is_empty().await);

        assert!(matches!(
            store.consume("a@ufl.edu", &code).await,
            Err(AuthError::PendingVerificationNotFound)
        ));
    }
}
