use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

/// Initialize JSON log output. `RUST_LOG` overrides the `info` default.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

/// GDPR-safe identifier for log lines: first 12 hex characters of the
/// SHA-256 of the email address. Raw addresses never reach the logs.
pub fn hash_email(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    hex::encode(digest)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_email_is_short_stable_and_opaque() {
        let hash = hash_email("user@example.com");
        assert_eq!(hash.len(), 12);
        assert_eq!(hash, hash_email("user@example.com"));
        assert_ne!(hash, hash_email("other@example.com"));
        assert!(!hash.contains('@'));
    }
}
