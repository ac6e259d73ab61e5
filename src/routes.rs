use axum::{
    routing::{get, post},
    Router,
};

use crate::billing;

pub fn api_routes() -> Router {
    Router::new()
        .route("/webhooks/stripe", post(billing::api::stripe_webhook))
        .route("/credits/balance", get(billing::api::credits_balance))
        .route("/credits/purchase", post(billing::api::purchase_credits))
        .route(
            "/subscriptions/current",
            get(billing::api::current_subscription),
        )
}
