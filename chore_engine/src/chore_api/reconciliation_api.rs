use std::{fmt::Debug, sync::Arc};

use chore_common::Money;
use chrono::Utc;
use log::*;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{
    chore_api::{
        errors::OrderFlowError,
        order_objects::{OrderDefaults, ReconciliationOutcome},
    },
    db_types::{merge_metadata, Metadata, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderPaidEvent},
    traits::{
        CheckoutCompleted,
        CheckoutRequest,
        CheckoutSessionInfo,
        OrderStore,
        OrderStoreError,
        PaymentEvent,
        PaymentProvider,
        PaymentProviderError,
    },
};

/// Metadata key holding the ids of provider notifications that have already been applied to an order.
pub const PROCESSED_EVENTS_KEY: &str = "providerEventIds";

/// Metadata keys that correlate an order with a payment. Orders are matched to payments through them, so they are
/// only ever written by reconciliation and checkout bookkeeping.
pub const PAYMENT_METADATA_KEYS: [&str; 8] = [
    "checkoutSessionId",
    "checkoutInitiated",
    "checkoutTime",
    "paymentIntentId",
    "paymentStatus",
    "paidAt",
    "paymentProvider",
    PROCESSED_EVENTS_KEY,
];

/// `ReconciliationApi` connects orders with a payment provider's hosted checkout.
///
/// It starts checkout sessions, and matches the provider's asynchronous payment notifications to local orders. A
/// notification is matched on its order reference first, and then on the checkout session id recorded on an order.
/// If neither matches, a new order is created from the notification.
///
/// Notifications are reconciled one at a time, so that two deliveries of the same notification cannot both decide that
/// the order does not exist yet.
pub struct ReconciliationApi<S> {
    store: S,
    producers: EventProducers,
    defaults: OrderDefaults,
    lock: Arc<Mutex<()>>,
}

impl<S> Debug for ReconciliationApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<S: Clone> Clone for ReconciliationApi<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            producers: self.producers.clone(),
            defaults: self.defaults.clone(),
            lock: Arc::clone(&self.lock),
        }
    }
}

impl<S> ReconciliationApi<S> {
    pub fn new(store: S, producers: EventProducers) -> Self {
        Self { store, producers, defaults: OrderDefaults::for_payments(), lock: Arc::new(Mutex::new(())) }
    }

    pub fn with_defaults(mut self, defaults: OrderDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> ReconciliationApi<S>
where S: OrderStore
{
    /// Creates a hosted checkout session with `provider`.
    ///
    /// If the request carries an order reference that matches a local order, the session id is recorded on the order.
    /// That bookkeeping is best effort: failures are logged and the session is returned regardless.
    pub async fn start_checkout<P: PaymentProvider>(
        &self,
        provider: &P,
        request: CheckoutRequest,
    ) -> Result<CheckoutSessionInfo, OrderFlowError> {
        if !provider.is_available() {
            warn!("💳️ A checkout was requested, but {} is not available", provider.name());
            return Err(PaymentProviderError::ProviderUnavailable(provider.name().to_string()).into());
        }
        if request.amount.is_negative() || request.amount.is_zero() {
            return Err(OrderFlowError::ValidationError(format!(
                "A checkout amount must be positive, but {} was requested",
                request.amount
            )));
        }
        let reference = request.order_reference().map(OrderId::from);
        let amount = request.amount;
        let session = provider.create_checkout_session(request).await?;
        info!("💳️ {} checkout session {} created for {amount}", provider.name(), session.session_id);
        if let Some(reference) = reference {
            match self.store.merge_metadata(&reference, checkout_metadata(&session.session_id)).await {
                Ok(_) => debug!("💳️ Checkout session {} recorded against order {reference}", session.session_id),
                Err(OrderStoreError::OrderNotFound(_)) => {
                    debug!("💳️ Order {reference} does not exist yet. The session will be matched when it is paid.")
                },
                Err(e) => warn!("💳️ Could not record checkout session {} on {reference}. {e}", session.session_id),
            }
        }
        Ok(session)
    }

    /// Authenticates a raw notification body with `provider` and reconciles it.
    ///
    /// Nothing is changed if verification fails.
    pub async fn process_webhook<P: PaymentProvider>(
        &self,
        provider: &P,
        payload: &[u8],
        signature: Option<String>,
    ) -> Result<ReconciliationOutcome, OrderFlowError> {
        let event = provider.verify_and_parse_event(payload, signature).map_err(|e| {
            warn!("💳️ Rejected a {} notification. {e}", provider.name());
            e
        })?;
        debug!("💳️ Verified {} notification {}", provider.name(), event.event_id());
        self.process_event(event).await
    }

    /// Applies an authenticated payment notification to the order collection.
    pub async fn process_event(&self, event: PaymentEvent) -> Result<ReconciliationOutcome, OrderFlowError> {
        match event {
            PaymentEvent::CheckoutCompleted(completed) => self.reconcile_checkout(completed).await,
            PaymentEvent::PaymentSucceeded { event_id, payment_id, amount } => {
                let amount = amount.map(|a| a.to_string()).unwrap_or_else(|| "an unknown amount".into());
                info!("💳️ Payment {payment_id} for {amount} succeeded ({event_id})");
                Ok(ReconciliationOutcome::Ignored)
            },
            PaymentEvent::PaymentFailed { event_id, payment_id, reason } => {
                let reason = reason.unwrap_or_else(|| "no reason given".into());
                warn!("💳️ Payment {payment_id} failed: {reason} ({event_id})");
                Ok(ReconciliationOutcome::Ignored)
            },
            PaymentEvent::Other { event_id, event_type } => {
                info!("💳️ Unhandled event type {event_type} ({event_id})");
                Ok(ReconciliationOutcome::Ignored)
            },
        }
    }

    async fn reconcile_checkout(&self, event: CheckoutCompleted) -> Result<ReconciliationOutcome, OrderFlowError> {
        let _guard = self.lock.lock().await;
        match self.find_matching_order(&event).await? {
            Some(order) if already_processed(&order, &event.event_id) => {
                info!("💳️ Notification {} has already been applied to order {}", event.event_id, order.id);
                Ok(ReconciliationOutcome::AlreadyProcessed(order))
            },
            Some(order) => {
                let patch = payment_metadata(&event, &order.metadata);
                let order = self.store.merge_metadata(&order.id, patch).await?;
                info!(
                    "💳️ Order {} confirmed as paid through {} (session {})",
                    order.id, event.provider, event.session_id
                );
                self.notify_paid(&order, &event.session_id, false).await;
                Ok(ReconciliationOutcome::Updated(order))
            },
            None => {
                let order = self.order_from_payment(&event)?;
                let order = self.store.create(order).await?;
                info!(
                    "💳️ Created order {} for {} from {} checkout session {}",
                    order.id, order.total_amount, event.provider, event.session_id
                );
                for emitter in &self.producers.order_created_producer {
                    emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
                }
                self.notify_paid(&order, &event.session_id, true).await;
                Ok(ReconciliationOutcome::Created(order))
            },
        }
    }

    async fn find_matching_order(&self, event: &CheckoutCompleted) -> Result<Option<Order>, OrderFlowError> {
        if let Some(reference) = event.order_reference() {
            if let Some(order) = self.store.find_by_id(&OrderId::from(reference)).await? {
                return Ok(Some(order));
            }
            debug!("💳️ No order matches reference {reference}");
        }
        if event.session_id.is_empty() {
            return Ok(None);
        }
        Ok(self.store.find_by_metadata("checkoutSessionId", &event.session_id).await?)
    }

    /// Builds a new `Pending` order from a checkout notification that did not match any local order.
    ///
    /// The order always gets a fresh id. An order reference in the notification is kept in the metadata, and a
    /// redelivery is matched to this order through its checkout session id.
    fn order_from_payment(&self, event: &CheckoutCompleted) -> Result<Order, OrderFlowError> {
        let amount = event.amount_total.unwrap_or_else(|| {
            warn!("💳️ Checkout session {} did not report an amount. Recording 0.", event.session_id);
            Money::default()
        });
        if amount.is_negative() {
            return Err(OrderFlowError::ValidationError(format!("Payment amount cannot be negative ({amount})")));
        }
        let mut metadata: Metadata =
            event.metadata.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
        let patch = payment_metadata(event, &metadata);
        merge_metadata(&mut metadata, patch);
        let now = Utc::now();
        Ok(Order {
            id: OrderId::random(),
            customer_name: non_blank(event.customer_name.as_deref())
                .unwrap_or(&self.defaults.customer_name)
                .to_string(),
            room_or_location: event.room().unwrap_or(&self.defaults.room_or_location).to_string(),
            service_description: non_blank(event.metadata.get("service").map(String::as_str))
                .unwrap_or(&self.defaults.service_description)
                .to_string(),
            amount_paid: amount,
            tip_amount: Money::default(),
            royalty_fee: amount.percentage(self.defaults.royalty_rate),
            total_amount: amount,
            status: OrderStatusType::Pending,
            payment_method: event.provider.clone(),
            created_at: now,
            updated_at: now,
            metadata,
        })
    }

    async fn notify_paid(&self, order: &Order, session_id: &str, created: bool) {
        for emitter in &self.producers.order_paid_producer {
            debug!("💳️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone(), session_id.to_string(), created)).await;
        }
    }
}

fn checkout_metadata(session_id: &str) -> Metadata {
    let mut patch = Metadata::new();
    patch.insert("checkoutSessionId".into(), Value::from(session_id));
    patch.insert("checkoutInitiated".into(), json!(true));
    patch.insert("checkoutTime".into(), Value::from(Utc::now().to_rfc3339()));
    patch
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn already_processed(order: &Order, event_id: &str) -> bool {
    !event_id.is_empty() &&
        order
            .metadata
            .get(PROCESSED_EVENTS_KEY)
            .and_then(Value::as_array)
            .is_some_and(|ids| ids.iter().any(|id| id.as_str() == Some(event_id)))
}

/// The payment details merged into an order's metadata. `existing` is the order's current metadata, used to extend
/// the list of processed notifications.
fn payment_metadata(event: &CheckoutCompleted, existing: &Metadata) -> Metadata {
    let mut patch = Metadata::new();
    patch.insert("checkoutSessionId".into(), Value::from(event.session_id.as_str()));
    if let Some(payment_id) = &event.payment_id {
        patch.insert("paymentIntentId".into(), Value::from(payment_id.as_str()));
    }
    if let Some(email) = &event.customer_email {
        patch.insert("customerEmail".into(), Value::from(email.as_str()));
    }
    let status = event.payment_status.as_deref().unwrap_or("paid");
    patch.insert("paymentStatus".into(), Value::from(status));
    patch.insert("paidAt".into(), Value::from(Utc::now().to_rfc3339()));
    patch.insert("paymentProvider".into(), Value::from(event.provider.as_str()));
    if !event.event_id.is_empty() {
        let mut ids = existing.get(PROCESSED_EVENTS_KEY).and_then(Value::as_array).cloned().unwrap_or_default();
        ids.push(Value::from(event.event_id.as_str()));
        patch.insert(PROCESSED_EVENTS_KEY.into(), Value::Array(ids));
    }
    patch
}
