//! API consumer credentials.
//!
//! Secrets are shown once at creation and stored only as SHA-256 digests.

use sha2::{Digest, Sha256};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{encode_timestamp, now_utc, CountyDb};

/// A freshly generated key and secret pair.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Generates a random 32 hex char key and 64 hex char secret.
pub fn generate_credentials() -> ApiCredentials {
    ApiCredentials {
        api_key: Uuid::new_v4().simple().to_string(),
        api_secret: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
    }
}

/// SHA-256 hex digest of a secret.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Compares two digests without short-circuiting on the first difference.
pub(crate) fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

impl CountyDb {
    /// Stores a consumer. Fails if the key already exists.
    pub async fn create_consumer(&self, credentials: &ApiCredentials) -> Result<(), StoreError> {
        let api_key = credentials.api_key.clone();
        let digest = hash_secret(&credentials.api_secret);
        let created_at = encode_timestamp(now_utc());

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO api_consumer (api_key, secret_hash, created_at) VALUES (?1, ?2, ?3)",
                    params![api_key, digest, created_at],
                )
            })
            .await?;
        Ok(())
    }

    /// Checks a key and secret pair against the stored digest.
    pub async fn verify_consumer(&self, api_key: &str, api_secret: &str) -> Result<bool, StoreError> {
        let key = api_key.to_string();
        let stored: Option<String> = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT secret_hash FROM api_consumer WHERE api_key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        Ok(stored.is_some_and(|digest| digests_match(&digest, &hash_secret(api_secret))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_credentials_shape() {
        let creds = generate_credentials();
        assert_eq!(creds.api_key.len(), 32);
        assert_eq!(creds.api_secret.len(), 64);
        assert_ne!(generate_credentials().api_key, creds.api_key);
    }

    #[test]
    fn test_hash_secret_known_value() {
        assert_eq!(
            hash_secret("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digests_match() {
        assert!(digests_match("abcd", "abcd"));
        assert!(!digests_match("abcd", "abce"));
        assert!(!digests_match("abcd", "abc"));
    }

    #[tokio::test]
    async fn test_verify_consumer() {
        let db = CountyDb::open_in_memory().await.unwrap();
        let creds = generate_credentials();
        db.create_consumer(&creds).await.unwrap();

        assert!(db.verify_consumer(&creds.api_key, &creds.api_secret).await.unwrap());
        assert!(!db.verify_consumer(&creds.api_key, "wrong").await.unwrap());
        assert!(!db.verify_consumer("nobody", &creds.api_secret).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let db = CountyDb::open_in_memory().await.unwrap();
        let creds = generate_credentials();
        db.create_consumer(&creds).await.unwrap();
        assert!(db.create_consumer(&creds).await.is_err());
    }
}
