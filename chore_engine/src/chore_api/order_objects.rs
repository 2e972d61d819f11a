use chore_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Metadata, Order, OrderId, DEFAULT_SERVICE_DESCRIPTION};

pub const DEFAULT_ROYALTY_RATE: f64 = 0.15;
pub const DEFAULT_PAYMENT_ROYALTY_RATE: f64 = 0.10;

/// Order data as submitted by a customer. Everything except an amount is optional, and missing values are filled in
/// from [`OrderDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    /// The client's order reference. It becomes the order id.
    pub order_reference: Option<OrderId>,
    pub customer_name: Option<String>,
    pub room_or_location: Option<String>,
    pub service_description: Option<String>,
    pub total_amount: Option<Money>,
    pub amount_paid: Option<Money>,
    pub tip_amount: Option<Money>,
    pub royalty_fee: Option<Money>,
    pub payment_method: Option<String>,
    pub metadata: Metadata,
}

impl NewOrder {
    pub fn new(total_amount: Money) -> Self {
        Self { total_amount: Some(total_amount), ..Default::default() }
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.order_reference = Some(OrderId(reference.into()));
        self
    }

    pub fn with_customer<S: Into<String>>(mut self, name: S, room: S) -> Self {
        self.customer_name = Some(name.into());
        self.room_or_location = Some(room.into());
        self
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_royalty_fee(mut self, fee: Money) -> Self {
        self.royalty_fee = Some(fee);
        self
    }
}

/// Values used for fields an order was created without.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDefaults {
    /// The vendor's commission, as a fraction of the amount paid
    pub royalty_rate: f64,
    pub customer_name: String,
    pub room_or_location: String,
    pub service_description: String,
    pub payment_method: String,
}

impl Default for OrderDefaults {
    fn default() -> Self {
        Self {
            royalty_rate: DEFAULT_ROYALTY_RATE,
            customer_name: "Guest".to_string(),
            room_or_location: "Unknown".to_string(),
            service_description: DEFAULT_SERVICE_DESCRIPTION.to_string(),
            payment_method: "cash".to_string(),
        }
    }
}

impl OrderDefaults {
    /// Defaults for orders that are first heard of through a payment notification.
    pub fn for_payments() -> Self {
        Self {
            royalty_rate: DEFAULT_PAYMENT_ROYALTY_RATE,
            room_or_location: "Not specified".to_string(),
            service_description: "14kg Mixed Load".to_string(),
            ..Default::default()
        }
    }

    pub fn with_royalty_rate(mut self, rate: f64) -> Self {
        self.royalty_rate = rate;
        self
    }

    pub fn with_service_description<S: Into<String>>(mut self, description: S) -> Self {
        self.service_description = description.into();
        self
    }
}

/// What the reconciliation handler did with a payment notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    /// An existing order was confirmed as paid.
    Updated(Order),
    /// No matching order existed, so one was created from the notification.
    Created(Order),
    /// The notification had been processed before. Nothing was changed.
    AlreadyProcessed(Order),
    /// The notification does not affect orders.
    Ignored,
}

impl ReconciliationOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            ReconciliationOutcome::Updated(o) |
            ReconciliationOutcome::Created(o) |
            ReconciliationOutcome::AlreadyProcessed(o) => Some(o),
            ReconciliationOutcome::Ignored => None,
        }
    }
}
