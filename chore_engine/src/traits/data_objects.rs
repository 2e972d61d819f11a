use std::{collections::BTreeMap, fmt::Display};

use chore_common::Money;
use serde::{Deserialize, Serialize};

//--------------------------------------    CheckoutRequest     ------------------------------------------------------
/// A request for a hosted payment page for a single service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub amount: Money,
    pub product_name: String,
    pub description: Option<String>,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    /// Correlation data handed back in the payment notification, e.g. `orderReference` and `room`.
    pub metadata: BTreeMap<String, String>,
}

impl CheckoutRequest {
    pub fn order_reference(&self) -> Option<&str> {
        order_reference(&self.metadata)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionInfo {
    pub session_id: String,
    /// Where to send the customer to pay.
    pub url: Option<String>,
}

//--------------------------------------    SessionDetails      ------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    pub session_id: String,
    pub amount_total: Option<Money>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Authorized,
    Paid,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundReceipt {
    pub refund_id: String,
    pub payment_id: String,
    pub amount: Money,
    pub status: String,
}

//--------------------------------------     PaymentEvent       ------------------------------------------------------
/// An authenticated notification from a payment provider, translated into provider-agnostic terms.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    CheckoutCompleted(CheckoutCompleted),
    PaymentSucceeded { event_id: String, payment_id: String, amount: Option<Money> },
    PaymentFailed { event_id: String, payment_id: String, reason: Option<String> },
    Other { event_id: String, event_type: String },
}

impl PaymentEvent {
    pub fn event_id(&self) -> &str {
        match self {
            PaymentEvent::CheckoutCompleted(c) => &c.event_id,
            PaymentEvent::PaymentSucceeded { event_id, .. } => event_id,
            PaymentEvent::PaymentFailed { event_id, .. } => event_id,
            PaymentEvent::Other { event_id, .. } => event_id,
        }
    }
}

/// A customer finished paying on a hosted checkout page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutCompleted {
    /// Name of the provider that sent the event, e.g. `stripe`
    pub provider: String,
    /// Provider's id for this notification. Redeliveries of the same notification carry the same id.
    pub event_id: String,
    pub session_id: String,
    pub payment_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount_total: Option<Money>,
    pub payment_status: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl CheckoutCompleted {
    pub fn order_reference(&self) -> Option<&str> {
        order_reference(&self.metadata)
    }

    pub fn room(&self) -> Option<&str> {
        self.metadata.get("room").map(String::as_str).filter(|s| !s.trim().is_empty())
    }
}

fn order_reference(metadata: &BTreeMap<String, String>) -> Option<&str> {
    metadata
        .get("orderReference")
        .or_else(|| metadata.get("orderId"))
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
}
