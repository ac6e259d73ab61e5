use anyhow::Result;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::models::{OperationType, Subscription};

/// key: billing-usage -> consumption recording
#[derive(Clone)]
pub struct UsageRecorder {
    pool: PgPool,
}

impl UsageRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records consumption after the fact. Best-effort on purpose: a failed
    /// write is logged and swallowed so the caller's primary action is never
    /// blocked, accepting under-counting while the store is down.
    pub async fn track_usage(
        &self,
        user_id: i32,
        operation: OperationType,
        duration_seconds: i64,
        session_id: Option<Uuid>,
    ) {
        if let Err(err) = self
            .record(user_id, operation, duration_seconds, session_id)
            .await
        {
            warn!(
                ?err,
                %user_id,
                operation = operation.as_str(),
                "usage tracking failed; primary action continues"
            );
        }
    }

    async fn record(
        &self,
        user_id: i32,
        operation: OperationType,
        duration_seconds: i64,
        session_id: Option<Uuid>,
    ) -> Result<()> {
        let minutes = minutes_from_seconds(duration_seconds);
        if minutes == 0 {
            return Ok(());
        }

        let record = match Subscription::for_user(&self.pool, user_id).await? {
            Subscription::Free => {
                debug!(%user_id, "no subscription on file; usage is unmetered");
                return Ok(());
            }
            Subscription::Persisted(record) => record,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO usage_events (id, user_id, event_type, minutes_consumed, billing_period, session_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(operation.as_str())
        .bind(minutes)
        .bind(record.billing_period())
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        // Single server-side increment; a read-modify-write here would lose
        // updates under concurrent completions.
        sqlx::query(
            "UPDATE subscriptions SET minutes_used = minutes_used + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(minutes)
        .bind(record.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(())
    }
}

/// Billed minutes for a recorded duration: ceiling division, so any positive
/// duration bills at least one minute.
pub fn minutes_from_seconds(duration_seconds: i64) -> i32 {
    if duration_seconds <= 0 {
        return 0;
    }
    ((duration_seconds + 59) / 60) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_minutes_round_up() {
        assert_eq!(minutes_from_seconds(61), 2);
        assert_eq!(minutes_from_seconds(60), 1);
        assert_eq!(minutes_from_seconds(300), 5);
        assert_eq!(minutes_from_seconds(1), 1);
        assert_eq!(minutes_from_seconds(59), 1);
    }

    #[test]
    fn non_positive_durations_bill_nothing() {
        assert_eq!(minutes_from_seconds(0), 0);
        assert_eq!(minutes_from_seconds(-30), 0);
    }
}
