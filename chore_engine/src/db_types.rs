use std::{fmt::Display, str::FromStr};

use chore_common::Money;
use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Free-form JSON attached to an order. Payment providers and the web form store correlation data here.
pub type Metadata = Map<String, Value>;

pub const DEFAULT_SERVICE_DESCRIPTION: &str = "Laundry – 14kg Mixed Load";

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// A fresh id for orders submitted without an order reference, e.g. `order-1718000000000-4f1c2a9b`.
    pub fn generate() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("order-{}-{}", Utc::now().timestamp_millis(), &suffix[..8]))
    }

    /// A fresh, random id for orders that are created from a payment notification.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The three-stage order lifecycle. The declaration order is the lifecycle order, so `Ord` tells you whether a
/// transition moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed (and possibly paid), but the laundry has not been collected yet.
    Pending,
    /// The vendor has collected the laundry.
    PickedUp,
    /// The clean laundry has been returned to the customer.
    Delivered,
}

impl OrderStatusType {
    /// Orders only ever move forward through the lifecycle. Staying in the same state is allowed.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        next >= *self
    }

    /// Parses status values written by earlier deployments of the service, which used display strings and had a
    /// different set of states. Returns `None` for values that cannot be mapped.
    pub fn from_legacy(value: &str) -> Option<Self> {
        let normalised = value.trim().to_lowercase().replace(['_', '-'], " ");
        match normalised.as_str() {
            "pending" | "new" => Some(Self::Pending),
            "pickedup" | "picked up" | "in progress" => Some(Self::PickedUp),
            "delivered" | "completed" => Some(Self::Delivered),
            _ => None,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::PickedUp => write!(f, "PickedUp"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    /// Strict parsing, used for status updates. Only the canonical names (and the "Picked Up" spelling the dashboard
    /// uses) are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "PickedUp" | "Picked Up" => Ok(Self::PickedUp),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredOrder")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub room_or_location: String,
    pub service_description: String,
    pub amount_paid: Money,
    pub tip_amount: Money,
    pub royalty_fee: Money,
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Order {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Merges `patch` into the order metadata. Incoming keys overwrite existing ones, and no key is ever removed.
    pub fn merge_metadata(&mut self, patch: Metadata) {
        merge_metadata(&mut self.metadata, patch);
    }
}

pub fn merge_metadata(target: &mut Metadata, patch: Metadata) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// The on-disk shape of an order. It accepts both the current document format and the one written by earlier
/// deployments (`name`, `room`, `service`, `royalty`, `time`, legacy status strings and missing fields).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredOrder {
    id: String,
    #[serde(alias = "name")]
    customer_name: Option<String>,
    #[serde(alias = "room")]
    room_or_location: Option<String>,
    #[serde(alias = "service")]
    service_description: Option<String>,
    amount_paid: Option<Money>,
    tip_amount: Option<Money>,
    #[serde(alias = "royalty")]
    royalty_fee: Option<Money>,
    total_amount: Option<Money>,
    status: Option<String>,
    payment_method: Option<String>,
    #[serde(alias = "time")]
    created_at: Option<String>,
    updated_at: Option<String>,
    metadata: Option<Metadata>,
}

fn parse_timestamp(id: &str, field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("🗃️ Order {id} has an invalid {field} timestamp ({value}). {e}");
            None
        },
    }
}

impl From<StoredOrder> for Order {
    fn from(stored: StoredOrder) -> Self {
        let id = stored.id;
        let status = match stored.status.as_deref() {
            None => OrderStatusType::Pending,
            Some(s) => OrderStatusType::from_legacy(s).unwrap_or_else(|| {
                warn!("🗃️ Order {id} has an unknown status '{s}'. Treating it as Pending.");
                OrderStatusType::Pending
            }),
        };
        let tip_amount = stored.tip_amount.unwrap_or_default();
        let (amount_paid, total_amount) = match (stored.amount_paid, stored.total_amount) {
            (Some(paid), Some(total)) => (paid, total),
            (Some(paid), None) => (paid, paid + tip_amount),
            (None, Some(total)) => ((total - tip_amount).max(Money::default()), total),
            (None, None) => (Money::default(), Money::default()),
        };
        let created = parse_timestamp(&id, "createdAt", stored.created_at.as_deref());
        let updated = parse_timestamp(&id, "updatedAt", stored.updated_at.as_deref());
        let created_at = created.or(updated).unwrap_or_else(Utc::now);
        let updated_at = updated.filter(|u| *u >= created_at).unwrap_or(created_at);
        Self {
            id: OrderId(id),
            customer_name: stored.customer_name.unwrap_or_else(|| "Guest".to_string()),
            room_or_location: stored.room_or_location.unwrap_or_else(|| "Unknown".to_string()),
            service_description: stored
                .service_description
                .unwrap_or_else(|| DEFAULT_SERVICE_DESCRIPTION.to_string()),
            amount_paid,
            tip_amount,
            royalty_fee: stored.royalty_fee.unwrap_or_default(),
            total_amount,
            status,
            payment_method: stored.payment_method.unwrap_or_else(|| "cash".to_string()),
            created_at,
            updated_at,
            metadata: stored.metadata.unwrap_or_default(),
        }
    }
}
