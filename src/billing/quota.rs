use anyhow::Result;
use sqlx::PgPool;

use super::models::{QuotaDecision, Subscription, Tier};

/// key: billing-quota -> request-time policy decision
///
/// Read-only: checking a quota never records usage or touches the ledger.
#[derive(Clone)]
pub struct QuotaEvaluator {
    pool: PgPool,
}

impl QuotaEvaluator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Decides whether a request for `required_minutes` may proceed. Store
    /// failures propagate to the caller; an assumed "allowed" would leak
    /// paid capacity.
    pub async fn check_quota(
        &self,
        user_id: i32,
        required_minutes: i32,
        allow_byok: bool,
    ) -> Result<QuotaDecision> {
        let subscription = Subscription::for_user(&self.pool, user_id).await?;

        let (tier, minutes_used, credits_balance) = match &subscription {
            Subscription::Free if allow_byok => return Ok(QuotaDecision::byok()),
            Subscription::Free => (Tier::Free, 0, 0),
            Subscription::Persisted(record) => {
                (record.tier(), record.minutes_used, record.credits_balance)
            }
        };

        let remaining = (tier.included_minutes() - minutes_used).max(0);
        if remaining >= required_minutes {
            return Ok(QuotaDecision::within_quota(remaining, required_minutes));
        }

        if credits_balance > 0 {
            return Ok(QuotaDecision::credit_funded(credits_balance));
        }

        Ok(QuotaDecision::exceeded(remaining, required_minutes))
    }
}
