use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::account::errors::AccountError;
use crate::account::ports::ResetTokenLedger;

/// Consumed reset tokens kept in Postgres so single use holds across instances.
pub struct PostgresResetLedger {
    pool: PgPool,
}

impl PostgresResetLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenLedger for PostgresResetLedger {
    async fn try_consume(
        &self,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AccountError> {
        // Expired fingerprints fail token validation before reaching here.
        match sqlx::query("DELETE FROM consumed_reset_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
        {
            Ok(done) if done.rows_affected() > 0 => {
                tracing::debug!(
                    pruned = done.rows_affected(),
                    "Pruned expired reset token fingerprints"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to prune reset token fingerprints"),
        }

        // The primary key makes the insert the claim: only one caller gets a row.
        let inserted = sqlx::query(
            r#"
            INSERT INTO consumed_reset_tokens (fingerprint, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (fingerprint) DO NOTHING
            "#,
        )
        .bind(fingerprint)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::Ledger(e.to_string()))?
        .rows_affected();

        Ok(inserted == 1)
    }
}
