use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StripeApiError;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";

//--------------------------------------   NewCheckoutSession   ------------------------------------------------------
/// A request for a hosted, single line-item checkout page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub amount_cents: i64,
    pub product_name: String,
    pub product_description: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl NewCheckoutSession {
    /// Flattens the request into Stripe's bracketed form encoding.
    pub fn to_form_params(&self, currency: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), currency.to_string()),
            ("line_items[0][price_data][unit_amount]".to_string(), self.amount_cents.to_string()),
            ("line_items[0][price_data][product_data][name]".to_string(), self.product_name.clone()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        if let Some(desc) = self.product_description.as_ref().filter(|d| !d.is_empty()) {
            params.push(("line_items[0][price_data][product_data][description]".to_string(), desc.clone()));
        }
        if let Some(email) = self.customer_email.as_ref().filter(|e| !e.is_empty()) {
            params.push(("customer_email".to_string(), email.clone()));
        }
        for (k, v) in &self.metadata {
            params.push((format!("metadata[{k}]"), v.clone()));
        }
        params
    }
}

//--------------------------------------    CheckoutSession     ------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Either the payment intent id, or the full object when the field was expanded.
    pub payment_intent: Option<Value>,
    pub payment_status: Option<String>,
    pub status: Option<String>,
}

impl CheckoutSession {
    pub fn payment_intent_id(&self) -> Option<String> {
        match self.payment_intent.as_ref()? {
            Value::String(id) => Some(id.clone()),
            Value::Object(obj) => obj.get("id").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|c| c.name.as_deref())
    }

    /// The e-mail the customer entered on the checkout page, falling back to the one the session was created with.
    pub fn email(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|c| c.email.as_deref()).or(self.customer_email.as_deref())
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

//--------------------------------------     PaymentIntent      ------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub last_payment_error: Option<Value>,
}

impl PaymentIntent {
    pub fn failure_message(&self) -> Option<&str> {
        self.last_payment_error.as_ref().and_then(|e| e.get("message")).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub payment_intent: Option<String>,
}

//--------------------------------------      StripeEvent       ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

impl StripeEvent {
    pub fn checkout_session(&self) -> Result<CheckoutSession, StripeApiError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| StripeApiError::JsonError(e.to_string()))
    }

    pub fn payment_intent(&self) -> Result<PaymentIntent, StripeApiError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| StripeApiError::JsonError(e.to_string()))
    }
}
