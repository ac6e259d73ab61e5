use serde::Serialize;
use tracing::info;

use crate::error::AppError;

use super::catalog;
use super::provider::PaymentProvider;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPurchaseIntent {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: i64,
    pub credits: i32,
}

/// key: billing-intents -> credit purchase setup
///
/// Creates the provider payment intent carrying attribution metadata. The
/// metadata is the only channel the reconciler later reads, so it must
/// survive the provider round-trip verbatim. No ledger mutation happens
/// here; the grant lands asynchronously once the payment succeeds.
pub async fn create_credit_purchase_intent(
    provider: &dyn PaymentProvider,
    user_id: i32,
    clerk_id: &str,
    credits: i32,
) -> Result<CreditPurchaseIntent, AppError> {
    let Some(amount_cents) = catalog::price_for_credits(credits) else {
        return Err(AppError::BadRequest(format!(
            "invalid credit amount {credits}; valid options are {}",
            catalog::catalog_options()
        )));
    };

    let metadata = [
        ("userId", user_id.to_string()),
        ("clerkId", clerk_id.to_string()),
        ("credits", credits.to_string()),
        ("type", "credit_purchase".to_string()),
    ];
    let intent = provider
        .create_payment_intent(amount_cents, "usd", &metadata)
        .await
        .map_err(|err| AppError::Message(format!("payment intent creation failed: {err}")))?;

    info!(
        %user_id,
        credits,
        amount_cents,
        intent = %intent.id,
        "created credit purchase intent"
    );
    Ok(CreditPurchaseIntent {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        credits,
    })
}
