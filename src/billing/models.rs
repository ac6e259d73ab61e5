use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// key: billing-models -> subscriptions,usage,ledger

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Team,
}

impl Tier {
    /// Minutes included per billing period.
    pub fn included_minutes(&self) -> i32 {
        match self {
            Tier::Free => 60,
            Tier::Pro => 500,
            Tier::Team => 2000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Team => "team",
        }
    }

    /// Unknown tier labels resolve to free.
    pub fn parse(raw: &str) -> Tier {
        match raw {
            "pro" => Tier::Pro,
            "team" => Tier::Team,
            _ => Tier::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Transcription,
    Summary,
    Chat,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Transcription => "transcription",
            OperationType::Summary => "summary",
            OperationType::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub user_id: i32,
    pub tier: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub minutes_used: i32,
    pub credits_balance: i32,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn tier(&self) -> Tier {
        Tier::parse(&self.tier)
    }

    /// Billing period label stamped on usage events, derived from the
    /// provider-set period start.
    pub fn billing_period(&self) -> String {
        self.current_period_start.format("%Y-%m").to_string()
    }
}

/// A user's subscription state. Absence of a stored row is itself a valid
/// state (unmetered free/BYOK) and is never written to the store.
#[derive(Debug, Clone)]
pub enum Subscription {
    Free,
    Persisted(SubscriptionRecord),
}

impl Subscription {
    pub async fn for_user(pool: &PgPool, user_id: i32) -> Result<Subscription, sqlx::Error> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(
            "SELECT * FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(match record {
            Some(record) => Subscription::Persisted(record),
            None => Subscription::Free,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: Uuid,
    pub user_id: i32,
    pub event_type: String,
    pub minutes_consumed: i32,
    pub billing_period: String,
    pub session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub subscription_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: i32,
    pub external_payment_id: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a quota check. Which fields are populated depends on the
/// branch that decided the request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDecision {
    pub allowed: bool,
    pub is_byok: bool,
    pub using_credits: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_required: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QuotaDecision {
    pub fn byok() -> Self {
        Self {
            allowed: true,
            is_byok: true,
            using_credits: false,
            minutes_remaining: None,
            minutes_required: None,
            credits_remaining: None,
            reason: None,
        }
    }

    pub fn within_quota(minutes_remaining: i32, minutes_required: i32) -> Self {
        Self {
            allowed: true,
            is_byok: false,
            using_credits: false,
            minutes_remaining: Some(minutes_remaining),
            minutes_required: Some(minutes_required),
            credits_remaining: None,
            reason: None,
        }
    }

    pub fn credit_funded(credits_remaining: i32) -> Self {
        Self {
            allowed: true,
            is_byok: false,
            using_credits: true,
            minutes_remaining: None,
            minutes_required: None,
            credits_remaining: Some(credits_remaining),
            reason: None,
        }
    }

    pub fn exceeded(minutes_remaining: i32, minutes_required: i32) -> Self {
        Self {
            allowed: false,
            is_byok: false,
            using_credits: false,
            minutes_remaining: Some(minutes_remaining),
            minutes_required: Some(minutes_required),
            credits_remaining: None,
            reason: Some("Quota exceeded".to_string()),
        }
    }
}
