use anyhow::{anyhow, bail, Result};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::models::CreditTransaction;

/// key: billing-ledger -> append-only credit transactions
///
/// Every balance change goes through here as a transaction row plus the
/// balance update in one database transaction, keeping
/// Σ(credit_transactions.amount) == subscriptions.credits_balance.
#[derive(Clone)]
pub struct CreditLedger {
    pool: PgPool,
}

#[derive(Debug, Clone, Copy)]
pub struct GrantOutcome {
    pub applied: bool,
    pub balance: i32,
}

impl CreditLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grants purchased credits. `external_payment_id` is the idempotency
    /// key: replaying a delivery that already landed is a no-op, which is
    /// what makes at-least-once webhook delivery safe. An unknown
    /// subscription is a hard error so a paid purchase is never dropped
    /// silently; the caller surfaces it and the provider retries.
    pub async fn add_credits(
        &self,
        subscription_id: Uuid,
        credits: i32,
        external_payment_id: &str,
        amount_paid_cents: i64,
        description: &str,
    ) -> Result<GrantOutcome> {
        if credits <= 0 {
            bail!("credit grant must be positive, got {credits}");
        }

        let mut tx = self.pool.begin().await?;
        // Resolve the owner up front so an unknown subscription surfaces as
        // a retryable error rather than a constraint violation from the
        // ledger insert.
        let current_balance: Option<i32> =
            sqlx::query_scalar("SELECT credits_balance FROM subscriptions WHERE id = $1")
                .bind(subscription_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current_balance) = current_balance else {
            bail!("credit grant for unknown subscription {subscription_id}");
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO credit_transactions (id, subscription_id, type, amount, external_payment_id, description)
            VALUES ($1, $2, 'purchase', $3, $4, $5)
            ON CONFLICT (external_payment_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subscription_id)
        .bind(credits)
        .bind(external_payment_id)
        .bind(description)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            info!(
                %subscription_id,
                payment = external_payment_id,
                "credit purchase already applied; ignoring replay"
            );
            return Ok(GrantOutcome {
                applied: false,
                balance: current_balance,
            });
        }

        let balance: i32 = sqlx::query_scalar(
            r#"
            UPDATE subscriptions
            SET credits_balance = credits_balance + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING credits_balance
            "#,
        )
        .bind(credits)
        .bind(subscription_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(
            %subscription_id,
            credits,
            amount_paid_cents,
            payment = external_payment_id,
            balance,
            "credit purchase applied"
        );
        Ok(GrantOutcome {
            applied: true,
            balance,
        })
    }

    pub async fn balance(&self, subscription_id: Uuid) -> Result<i32> {
        let balance: Option<i32> =
            sqlx::query_scalar("SELECT credits_balance FROM subscriptions WHERE id = $1")
                .bind(subscription_id)
                .fetch_optional(&self.pool)
                .await?;
        balance.ok_or_else(|| anyhow!("unknown subscription {subscription_id}"))
    }

    /// Most recent transactions, newest first.
    pub async fn recent_transactions(
        &self,
        subscription_id: Uuid,
        limit: i64,
    ) -> Result<Vec<CreditTransaction>> {
        let transactions = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT * FROM credit_transactions
            WHERE subscription_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(subscription_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }
}
