pub mod api;
pub mod catalog;
pub mod events;
pub mod intents;
pub mod ledger;
pub mod models;
pub mod provider;
pub mod quota;
pub mod reconciler;
pub mod usage;

pub use intents::{create_credit_purchase_intent, CreditPurchaseIntent};
pub use ledger::{CreditLedger, GrantOutcome};
pub use models::{
    CreditTransaction, OperationType, QuotaDecision, Subscription, SubscriptionRecord, Tier,
    UsageEvent,
};
pub use provider::{PaymentIntent, PaymentProvider, StripeProvider};
pub use quota::QuotaEvaluator;
pub use reconciler::{verify_signature, SubscriptionReconciler, WebhookError};
pub use usage::{minutes_from_seconds, UsageRecorder};
