use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Provider event envelope. Only `data.object` is interpreted further,
/// according to the event type.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

pub type Metadata = HashMap<String, String>;

/// The provider's full current subscription state; events carry a complete
/// snapshot, which is what makes last-write-wins upserts safe.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_start: i64,
    pub current_period_end: i64,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub items: SubscriptionItems,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub price: Price,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
}

impl SubscriptionObject {
    pub fn price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }

    pub fn metadata_user_id(&self) -> Option<i32> {
        self.metadata.get("userId").and_then(|raw| raw.parse().ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_received: i64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl PaymentIntentObject {
    pub fn is_credit_purchase(&self) -> bool {
        self.metadata
            .get("type")
            .map(|value| value == "credit_purchase")
            .unwrap_or(false)
    }

    pub fn metadata_user_id(&self) -> Option<i32> {
        self.metadata.get("userId").and_then(|raw| raw.parse().ok())
    }

    pub fn metadata_credits(&self) -> Option<i32> {
        self.metadata.get("credits").and_then(|raw| raw.parse().ok())
    }

    pub fn paid_cents(&self) -> i64 {
        if self.amount_received > 0 {
            self.amount_received
        } else {
            self.amount
        }
    }
}
