use std::fmt::Debug;

use chore_common::Money;
use chrono::Utc;
use log::*;

use crate::{
    chore_api::{
        errors::OrderFlowError,
        order_objects::{NewOrder, OrderDefaults},
        reconciliation_api::PAYMENT_METADATA_KEYS,
    },
    db_types::{Metadata, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    traits::OrderStore,
};

/// `OrderFlowApi` is the order lifecycle service. It turns submitted order data into order records and moves orders
/// through the `Pending` → `PickedUp` → `Delivered` lifecycle.
pub struct OrderFlowApi<S> {
    store: S,
    producers: EventProducers,
    defaults: OrderDefaults,
}

impl<S> Debug for OrderFlowApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<S: Clone> Clone for OrderFlowApi<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), producers: self.producers.clone(), defaults: self.defaults.clone() }
    }
}

impl<S> OrderFlowApi<S> {
    pub fn new(store: S, producers: EventProducers) -> Self {
        Self { store, producers, defaults: OrderDefaults::default() }
    }

    pub fn with_defaults(mut self, defaults: OrderDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn defaults(&self) -> &OrderDefaults {
        &self.defaults
    }

    /// Builds a complete `Pending` order record from submitted data, filling in defaults.
    ///
    /// The royalty fee is `amount_paid × royalty_rate` unless a fee was supplied. It is calculated here, once, and
    /// never recalculated.
    ///
    /// Submitted metadata cannot carry payment correlation keys (see [`PAYMENT_METADATA_KEYS`]). Only reconciliation
    /// writes those, so they are dropped here.
    pub fn build_order(&self, input: NewOrder) -> Result<Order, OrderFlowError> {
        let total_amount = input
            .total_amount
            .ok_or_else(|| OrderFlowError::ValidationError("Total amount is required".to_string()))?;
        let amount_paid = input.amount_paid.unwrap_or(total_amount);
        let tip_amount = input.tip_amount.unwrap_or_default();
        let royalty_fee = input.royalty_fee.unwrap_or_else(|| amount_paid.percentage(self.defaults.royalty_rate));
        for (name, value) in [
            ("Total amount", total_amount),
            ("Amount paid", amount_paid),
            ("Tip amount", tip_amount),
            ("Royalty fee", royalty_fee),
        ] {
            check_amount(name, value)?;
        }
        let id = input.order_reference.filter(|r| !r.as_str().trim().is_empty()).unwrap_or_else(OrderId::generate);
        let metadata = without_payment_keys(&id, input.metadata);
        let now = Utc::now();
        Ok(Order {
            id,
            customer_name: or_default(input.customer_name, &self.defaults.customer_name),
            room_or_location: or_default(input.room_or_location, &self.defaults.room_or_location),
            service_description: or_default(input.service_description, &self.defaults.service_description),
            amount_paid,
            tip_amount,
            royalty_fee,
            total_amount,
            status: OrderStatusType::Pending,
            payment_method: or_default(input.payment_method, &self.defaults.payment_method),
            created_at: now,
            updated_at: now,
            metadata,
        })
    }
}

fn without_payment_keys(id: &OrderId, mut metadata: Metadata) -> Metadata {
    for key in PAYMENT_METADATA_KEYS {
        if metadata.remove(key).is_some() {
            warn!("🔄️📦️ Ignoring '{key}' in the metadata submitted for order {id}. Only payments may set it.");
        }
    }
    metadata
}

fn check_amount(name: &str, value: Money) -> Result<(), OrderFlowError> {
    if value.is_negative() {
        Err(OrderFlowError::ValidationError(format!("{name} cannot be negative ({value})")))
    } else {
        Ok(())
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

impl<S> OrderFlowApi<S>
where S: OrderStore
{
    /// Submits a new order. If an order with the same id (order reference) already exists, it is replaced, keeping
    /// its creation time, status and metadata keys. Submitting the same order twice therefore results in one record.
    pub async fn create_order(&self, input: NewOrder) -> Result<Order, OrderFlowError> {
        let order = self.build_order(input)?;
        let order = self.store.create(order).await?;
        info!(
            "🔄️📦️ Order {} for {} ({}) saved. Total {}, royalty {}",
            order.id, order.customer_name, order.room_or_location, order.total_amount, order.royalty_fee
        );
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// All orders, newest first.
    pub async fn orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.store.find_all().await?;
        trace!("🔄️📦️ Fetched {} orders", orders.len());
        Ok(orders)
    }

    pub async fn order_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Moves an order to `status`.
    ///
    /// | From \ To  | Pending | PickedUp | Delivered |
    /// |------------|---------|----------|-----------|
    /// | Pending    | no-op   | Ok       | Ok        |
    /// | PickedUp   | Err     | no-op    | Ok        |
    /// | Delivered  | Err     | Err      | no-op     |
    ///
    /// A no-op returns the order unchanged. Backwards moves return [`OrderFlowError::InvalidStatusTransition`], and
    /// unknown orders return [`OrderFlowError::OrderNotFound`].
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatusType) -> Result<Order, OrderFlowError> {
        let order = self.store.find_by_id(id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        if order.status == status {
            debug!("🔄️🚚️ Order {id} is already {status}. Nothing to do.");
            return Ok(order);
        }
        if !order.status.can_transition_to(status) {
            warn!("🔄️🚚️ Refusing to move order {id} from {} back to {status}", order.status);
            return Err(OrderFlowError::InvalidStatusTransition { id: id.clone(), from: order.status, to: status });
        }
        let updated = self.store.update_status(id, status).await?;
        info!("🔄️🚚️ Order {id} is now {status}");
        for emitter in &self.producers.status_changed_producer {
            debug!("🔄️🚚️ Notifying status changed hook subscribers");
            emitter.publish_event(OrderStatusChangedEvent::new(updated.clone(), order.status)).await;
        }
        Ok(updated)
    }
}
