// Token revocation ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::StoreError;

/// One live token for one identity
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TokenRecord {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn matches(&self, token: &str) -> bool {
        self.token_hash == hash_token(token)
    }
}

/// Hash a token using SHA-256; only digests are ever stored
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persisted record of issued tokens.
///
/// Implementations must keep at most one record per identity, even under
/// concurrent `persist` calls for the same identity.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Replace every record for `user_id` with a record for `token`
    async fn persist(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError>;

    async fn revoke_all_for_identity(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Delete the record for this exact token, returning whether one existed
    async fn revoke_token(&self, token: &str) -> Result<bool, StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// Delete records whose expiry is at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Postgres-backed ledger; `user_tokens.user_id` is the primary key
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    /// Create a new PgTokenStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn persist(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, StoreError> {
        let token_hash = hash_token(token);

        // Delete and insert in one transaction; the upsert keeps concurrent
        // logins for the same identity from leaving two rows behind
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            INSERT INTO user_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET token_hash = EXCLUDED.token_hash,
                    expires_at = EXCLUDED.expires_at,
                    created_at = NOW()
            RETURNING user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from_sqlx)?;

        tx.commit().await?;

        debug!("Persisted token record for user {}", user_id);
        Ok(record)
    }

    async fn revoke_all_for_identity(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_token(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT user_id, token_hash, expires_at, created_at FROM user_tokens WHERE token_hash = $1",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Delete every record whose token has already expired
pub async fn sweep_expired(store: &dyn TokenStore) -> Result<u64, StoreError> {
    let removed = store.delete_expired(Utc::now()).await?;
    if removed > 0 {
        info!("Removed {} expired token records", removed);
    }
    Ok(removed)
}

/// Background task running `sweep_expired` on a fixed interval
pub async fn run_token_sweeper(store: Arc<dyn TokenStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_expired(store.as_ref()).await {
            error!("Expired token sweep failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_hash_token_is_stable_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_records() {
        let store = MemoryStore::new();
        let (stale, live) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .persist(stale, "stale", Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();
        store
            .persist(live, "live", Utc::now() + chrono::Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(sweep_expired(&store).await.unwrap(), 1);
        assert!(store.token_records_for(stale).await.is_empty());
        assert_eq!(store.token_records_for(live).await.len(), 1);
    }

    #[test]
    fn test_record_matches_only_its_token() {
        let record = TokenRecord {
            user_id: Uuid::new_v4(),
            token_hash: hash_token("token-1"),
            expires_at: Utc::now(),
            created_at: Utc::now(),
        };
        assert!(record.matches("token-1"));
        assert!(!record.matches("token-2"));
    }
}
