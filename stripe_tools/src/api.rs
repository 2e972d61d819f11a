use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{CheckoutSession, NewCheckoutSession, PaymentIntent, Refund},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        if config.secret_key.reveal().is_empty() {
            return Err(StripeApiError::MissingSecretKey);
        }
        let mut headers = HeaderMap::with_capacity(1);
        let val = HeaderValue::from_str(format!("Bearer {}", config.secret_key.reveal()).as_str())
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Sends a request to the Stripe REST API. Stripe takes form-encoded bodies with bracketed keys
    /// (`metadata[room]=12B`), so `form` is passed as already-flattened key/value pairs.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !form.is_empty() {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeApiError> {
        let form = session.to_form_params(&self.config.currency);
        debug!("💳️ Creating checkout session for {} ({} cents)", session.product_name, session.amount_cents);
        let result = self.rest_query::<CheckoutSession>(Method::POST, "/checkout/sessions", &form).await?;
        info!("💳️ Created checkout session {}", result.id);
        Ok(result)
    }

    pub async fn get_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError> {
        let path = format!("/checkout/sessions/{session_id}");
        debug!("💳️ Fetching checkout session {session_id}");
        self.rest_query::<CheckoutSession>(Method::GET, &path, &[]).await
    }

    pub async fn get_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, StripeApiError> {
        let path = format!("/payment_intents/{payment_intent_id}");
        debug!("💳️ Fetching payment intent {payment_intent_id}");
        self.rest_query::<PaymentIntent>(Method::GET, &path, &[]).await
    }

    /// Refunds a payment intent. When `amount_cents` is `None`, the full amount is refunded.
    pub async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount_cents: Option<i64>,
    ) -> Result<Refund, StripeApiError> {
        let mut form = vec![("payment_intent".to_string(), payment_intent_id.to_string())];
        if let Some(amount) = amount_cents {
            form.push(("amount".to_string(), amount.to_string()));
        }
        debug!("💳️ Requesting refund for {payment_intent_id}");
        let result = self.rest_query::<Refund>(Method::POST, "/refunds", &form).await?;
        info!("💳️ Refund {} for {payment_intent_id} is {}", result.id, result.status);
        Ok(result)
    }
}
