use std::collections::BTreeMap;

use chore_common::Money;
use chore_engine::{
    db_types::{Metadata, OrderId},
    order_objects::NewOrder,
    traits::{CheckoutRequest, PaymentStatus},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------    NewOrderRequest     ------------------------------------------------------
/// The order form as posted by the web client.
///
/// Keys the server does not recognise are kept and stored in the order's metadata, except the payment correlation
/// keys that only payments may set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(alias = "customerName")]
    pub name: Option<String>,
    #[serde(alias = "roomOrLocation")]
    pub room: Option<String>,
    #[serde(alias = "serviceDescription")]
    pub service: Option<String>,
    pub payment_method: Option<String>,
    #[serde(alias = "orderId")]
    pub order_reference: Option<String>,
    pub base_price: Option<Money>,
    pub total_amount: Option<Money>,
    pub amount_paid: Option<Money>,
    pub tip_amount: Option<Money>,
    pub royalty_fee: Option<Money>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Metadata,
}

impl From<NewOrderRequest> for NewOrder {
    fn from(req: NewOrderRequest) -> Self {
        let mut metadata = req.extra;
        if let Some(email) = req.email.filter(|e| !e.trim().is_empty()) {
            metadata.insert("customerEmail".into(), Value::from(email));
        }
        NewOrder {
            order_reference: req.order_reference.filter(|r| !r.trim().is_empty()).map(OrderId::from),
            customer_name: req.name,
            room_or_location: req.room,
            service_description: req.service,
            total_amount: req.total_amount.or(req.base_price),
            amount_paid: req.amount_paid,
            tip_amount: req.tip_amount,
            royalty_fee: req.royalty_fee,
            payment_method: req.payment_method,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

//--------------------------------------   CheckoutSessionRequest  ---------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    #[serde(alias = "price")]
    pub amount: Option<Money>,
    pub service: Option<String>,
    pub name: Option<String>,
    pub room: Option<String>,
    pub email: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub order_id: Option<String>,
    pub order_reference: Option<String>,
}

impl CheckoutSessionRequest {
    /// Builds the provider request. The product text shown on the payment page is derived from the service, name and
    /// room, and all of them travel along as metadata so the payment notification can be matched to the order.
    pub fn into_checkout_request(self, default_success_url: &str, default_cancel_url: &str) -> CheckoutRequest {
        let service = non_empty(self.service).unwrap_or_else(|| "Standard".to_string());
        let name = non_empty(self.name);
        let room = non_empty(self.room);
        let description = match (&name, &room) {
            (None, None) => None,
            (name, room) => Some(format!(
                "Laundry service for {} (Room: {})",
                name.as_deref().unwrap_or("Guest"),
                room.as_deref().unwrap_or("Not specified")
            )),
        };
        let reference = non_empty(self.order_reference);
        let order_id = non_empty(self.order_id).or_else(|| reference.clone());
        let mut metadata = BTreeMap::new();
        let fields = [
            ("orderId", order_id),
            ("orderReference", reference),
            ("service", Some(service.clone())),
            ("room", room),
            ("name", name),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                metadata.insert(key.to_string(), v);
            }
        }
        CheckoutRequest {
            amount: self.amount.unwrap_or_default(),
            product_name: format!("{service} Laundry Service"),
            description,
            customer_email: non_empty(self.email),
            success_url: non_empty(self.success_url).unwrap_or_else(|| default_success_url.to_string()),
            cancel_url: non_empty(self.cancel_url).unwrap_or_else(|| default_cancel_url.to_string()),
            metadata,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

//--------------------------------------     RefundRequest      ------------------------------------------------------
/// A refund of `amount`, or of the whole payment if no amount is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    #[serde(default, alias = "provider")]
    pub provider_id: String,
    #[serde(default)]
    pub payment_id: String,
    pub amount: Option<Money>,
    pub reason: Option<String>,
}

impl RefundRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.provider_id.trim().is_empty() || self.payment_id.trim().is_empty() {
            return Err("A refund needs a providerId and a paymentId".to_string());
        }
        match self.amount {
            Some(amount) if amount.is_negative() || amount.is_zero() => {
                Err(format!("A refund amount must be positive, but {amount} was requested"))
            },
            _ => Ok(()),
        }
    }
}

//--------------------------------------       Responses        ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: Vec<String>,
    pub vendors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub provider: String,
    pub payment_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub available: bool,
}
