use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config;

/// key: billing-provider -> payment intent seam
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
}

/// Stripe client over the form-encoded REST API.
pub struct StripeProvider {
    http: reqwest::Client,
    secret_key: Option<String>,
    api_base: String,
}

impl StripeProvider {
    pub fn new(secret_key: Option<String>, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            api_base,
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            config::STRIPE_SECRET_KEY.clone(),
            config::STRIPE_API_BASE.clone(),
        )
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| anyhow!("STRIPE_SECRET_KEY is not configured"))?;

        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), currency.to_string()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("payment intent creation failed with {status}: {body}");
        }
        Ok(response.json::<PaymentIntent>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn intent_request_is_form_encoded_with_metadata() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/payment_intents")
                    .body_contains("amount=1500")
                    .body_contains("currency=usd")
                    .body_contains("metadata%5Btype%5D=credit_purchase");
                then.status(200).json_body(json!({
                    "id": "pi_test_1",
                    "client_secret": "pi_test_1_secret",
                    "amount": 1500,
                }));
            })
            .await;

        let provider = StripeProvider::new(Some("sk_test_1".to_string()), server.base_url());
        let intent = provider
            .create_payment_intent(
                1500,
                "usd",
                &[("type", "credit_purchase".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(intent.id, "pi_test_1");
        assert_eq!(intent.client_secret, "pi_test_1_secret");
        assert_eq!(intent.amount, 1500);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn provider_error_statuses_are_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/payment_intents");
                then.status(402).body("card declined");
            })
            .await;

        let provider = StripeProvider::new(Some("sk_test_1".to_string()), server.base_url());
        let err = provider
            .create_payment_intent(500, "usd", &[])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("402"));
    }

    #[tokio::test]
    async fn missing_secret_key_fails_before_any_request() {
        let provider = StripeProvider::new(None, "http://127.0.0.1:1".to_string());
        let err = provider
            .create_payment_intent(500, "usd", &[])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("STRIPE_SECRET_KEY"));
    }
}
