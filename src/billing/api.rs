use std::sync::Arc;

use axum::body::Bytes;
use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config;
use crate::error::{AppError, AppResult};
use crate::extractor::AuthUser;

use super::intents::{create_credit_purchase_intent, CreditPurchaseIntent};
use super::ledger::CreditLedger;
use super::models::{Subscription, Tier};
use super::provider::PaymentProvider;
use super::reconciler::{SubscriptionReconciler, WebhookError};

/// key: billing-api -> rest endpoints

/// Body must stay raw bytes: parsing ahead of signature verification is
/// forbidden. Responses here are provider-facing status/text, not the JSON
/// error envelope the user-facing endpoints use.
pub async fn stripe_webhook(
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let reconciler = SubscriptionReconciler::new(
        pool,
        config::STRIPE_WEBHOOK_SECRET.clone(),
        config::PRICE_TIER_MAP.clone(),
    );
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok());

    match reconciler.handle_webhook(signature, &body).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "received": true }))).into_response(),
        Err(err @ WebhookError::MissingSecret) => {
            tracing::error!(%err, "webhook rejected");
            (StatusCode::INTERNAL_SERVER_ERROR, "webhook secret not configured").into_response()
        }
        Err(err @ (WebhookError::MissingSignature | WebhookError::BadSignature(_))) => {
            tracing::warn!(%err, "webhook rejected");
            (StatusCode::BAD_REQUEST, "invalid signature").into_response()
        }
        Err(WebhookError::Apply(err)) => {
            tracing::error!(?err, "webhook processing failed; provider will retry");
            (StatusCode::INTERNAL_SERVER_ERROR, "event processing failed").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    #[serde(default)]
    pub include_history: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub credits: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<TransactionView>>,
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

pub async fn credits_balance(
    Extension(pool): Extension<PgPool>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<BalanceQuery>,
) -> AppResult<Json<BalanceResponse>> {
    let include_history = query.include_history.unwrap_or(false);

    let record = match Subscription::for_user(&pool, user_id).await? {
        Subscription::Free => {
            return Ok(Json(BalanceResponse {
                credits: 0,
                history: include_history.then(Vec::new),
            }));
        }
        Subscription::Persisted(record) => record,
    };

    let history = if include_history {
        let ledger = CreditLedger::new(pool);
        let transactions = ledger
            .recent_transactions(record.id, 10)
            .await
            .map_err(|err| AppError::Message(err.to_string()))?;
        Some(
            transactions
                .into_iter()
                .map(|tx| TransactionView {
                    id: tx.id,
                    kind: tx.kind,
                    amount: tx.amount,
                    description: tx.description,
                    created_at: tx.created_at,
                })
                .collect(),
        )
    } else {
        None
    };

    Ok(Json(BalanceResponse {
        credits: record.credits_balance,
        history,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub credits: i32,
}

pub async fn purchase_credits(
    Extension(provider): Extension<Arc<dyn PaymentProvider>>,
    AuthUser { user_id, clerk_id }: AuthUser,
    Json(payload): Json<PurchaseRequest>,
) -> AppResult<Json<CreditPurchaseIntent>> {
    let intent =
        create_credit_purchase_intent(provider.as_ref(), user_id, &clerk_id, payload.credits)
            .await?;
    Ok(Json(intent))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: Option<Uuid>,
    pub tier: String,
    pub status: String,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub minutes_used: i32,
    pub credits_balance: i32,
}

pub async fn current_subscription(
    Extension(pool): Extension<PgPool>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<SubscriptionView>> {
    let view = match Subscription::for_user(&pool, user_id).await? {
        Subscription::Free => SubscriptionView {
            id: None,
            tier: Tier::Free.as_str().to_string(),
            status: "active".to_string(),
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            minutes_used: 0,
            credits_balance: 0,
        },
        Subscription::Persisted(record) => SubscriptionView {
            id: Some(record.id),
            tier: record.tier.clone(),
            status: record.status.clone(),
            current_period_start: Some(record.current_period_start),
            current_period_end: Some(record.current_period_end),
            cancel_at_period_end: record.cancel_at_period_end,
            minutes_used: record.minutes_used,
            credits_balance: record.credits_balance,
        },
    };
    Ok(Json(view))
}
