use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Opaque access/refresh credential pair handed to the client as cookies.
/// The server keeps only the SHA-256 hashes.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn generate() -> Self {
        Self {
            access_token: generate_token(),
            refresh_token: generate_token(),
        }
    }

    pub fn access_hash(&self) -> String {
        hash_token(&self.access_token)
    }

    pub fn refresh_hash(&self) -> String {
        hash_token(&self.refresh_token)
    }
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_distinct() {
        let pair = TokenPair::generate();
        assert_ne!(pair.access_token, pair.refresh_token);

        let other = TokenPair::generate();
        assert_ne!(pair.access_token, other.access_token);
        assert_ne!(pair.refresh_token, other.refresh_token);
    }

    #[test]
    fn test_token_is_cookie_safe() {
        let token = generate_token();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes of entropy, base64: 43 chars without padding
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn test_hash_is_deterministic_and_hides_token() {
        let token = generate_token();
        let h1 = hash_token(&token);
        let h2 = hash_token(&token);
        assert_eq!(h1, h2);
        assert_ne!(h1, token);
        assert_ne!(hash_token("other"), h1);
    }
}
