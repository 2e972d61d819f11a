use std::{collections::BTreeMap, str::FromStr};

use chore_common::Money;
use chore_engine::{
    db_types::{Order, OrderId, OrderStatusType},
    order_objects::{NewOrder, ReconciliationOutcome},
    traits::{CheckoutCompleted, PaymentEvent},
    OrderFlowError,
};
use cucumber::{then, when};

use crate::cucumber::OrderWorld;

fn money(value: f64) -> Money {
    Money::from_major(value).expect("Not a valid amount")
}

async fn fetch_order(world: &OrderWorld, id: &str) -> Order {
    world
        .orders()
        .order_by_id(&OrderId::from(id))
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {id} does not exist"))
}

async fn submit(world: &mut OrderWorld, order: NewOrder) {
    match world.orders().create_order(order).await {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "{word} in room {word} orders {word} for {float}")]
async fn receive_order(world: &mut OrderWorld, name: String, room: String, order_id: String, total: f64) {
    let order = NewOrder::new(money(total)).with_reference(order_id).with_customer(name, room);
    submit(world, order).await;
}

#[when(expr = "{word} in room {word} places an order for {float}")]
async fn receive_order_without_reference(world: &mut OrderWorld, name: String, room: String, total: f64) {
    let order = NewOrder::new(money(total)).with_customer(name, room);
    submit(world, order).await;
}

#[when(expr = "{word} orders {word} for {float} and tips {float}")]
async fn receive_order_with_tip(world: &mut OrderWorld, name: String, order_id: String, total: f64, tip: f64) {
    let mut order = NewOrder::new(money(total)).with_reference(order_id);
    order.customer_name = Some(name);
    order.tip_amount = Some(money(tip));
    submit(world, order).await;
}

#[when(expr = "an order {word} is submitted without an amount")]
async fn receive_order_without_amount(world: &mut OrderWorld, order_id: String) {
    let order = NewOrder { order_reference: Some(OrderId::from(order_id)), ..Default::default() };
    submit(world, order).await;
}

#[when(expr = "order {word} is marked {word}")]
async fn mark_order(world: &mut OrderWorld, order_id: String, status: String) {
    let status = OrderStatusType::from_str(&status).expect("Not a valid order status");
    match world.orders().update_order_status(&OrderId::from(order_id), status).await {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

fn checkout_completed(event_id: String, session_id: String, amount: f64, reference: Option<String>) -> PaymentEvent {
    let mut metadata = BTreeMap::new();
    if let Some(reference) = reference {
        metadata.insert("orderReference".to_string(), reference);
    }
    PaymentEvent::CheckoutCompleted(CheckoutCompleted {
        provider: "stripe".into(),
        event_id,
        session_id,
        payment_id: Some("pi_cucumber".into()),
        customer_email: Some("customer@example.com".into()),
        amount_total: Some(money(amount)),
        payment_status: Some("paid".into()),
        metadata,
        ..Default::default()
    })
}

async fn reconcile(world: &mut OrderWorld, event: PaymentEvent) {
    match world.payments().process_event(event).await {
        Ok(outcome) => {
            world.last_outcome = Some(outcome);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "checkout session {word} for order {word} is paid with {float} in event {word}")]
async fn checkout_paid(world: &mut OrderWorld, session_id: String, order_id: String, amount: f64, event_id: String) {
    let event = checkout_completed(event_id, session_id, amount, Some(order_id));
    reconcile(world, event).await;
}

#[when(expr = "checkout session {word} without an order reference is paid with {float} in event {word}")]
async fn anonymous_checkout_paid(world: &mut OrderWorld, session_id: String, amount: f64, event_id: String) {
    let event = checkout_completed(event_id, session_id, amount, None);
    reconcile(world, event).await;
}

#[when(expr = "the payment provider reports a {word} event")]
async fn other_event(world: &mut OrderWorld, event_type: String) {
    let event = PaymentEvent::Other { event_id: "evt_other".into(), event_type };
    reconcile(world, event).await;
}

#[then(expr = "there are {int} orders")]
async fn count_orders(world: &mut OrderWorld, count: usize) {
    let orders = world.orders().orders().await.expect("Error fetching orders");
    assert_eq!(orders.len(), count, "Unexpected number of orders");
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut OrderWorld, order_id: String, status: String) {
    let order = fetch_order(world, &order_id).await;
    assert_eq!(order.status.to_string(), status);
}

#[then(expr = "order {word} belongs to {word} in room {word}")]
async fn check_customer(world: &mut OrderWorld, order_id: String, name: String, room: String) {
    let order = fetch_order(world, &order_id).await;
    assert_eq!(order.customer_name, name);
    assert_eq!(order.room_or_location, room);
}

#[then(expr = "order {word} has a total of {float}, a tip of {float} and a royalty fee of {float}")]
async fn check_amounts(world: &mut OrderWorld, order_id: String, total: f64, tip: f64, royalty: f64) {
    let order = fetch_order(world, &order_id).await;
    assert_eq!(order.total_amount, money(total), "Total is incorrect");
    assert_eq!(order.tip_amount, money(tip), "Tip is incorrect");
    assert_eq!(order.royalty_fee, money(royalty), "Royalty fee is incorrect");
}

#[then(expr = "order {word} is paid through {word}")]
async fn check_payment_method(world: &mut OrderWorld, order_id: String, method: String) {
    let order = fetch_order(world, &order_id).await;
    assert_eq!(order.payment_method, method);
}

#[then(expr = "order {word} has {word} of '{word}'")]
async fn check_metadata(world: &mut OrderWorld, order_id: String, key: String, value: String) {
    let order = fetch_order(world, &order_id).await;
    assert_eq!(order.metadata_str(&key), Some(value.as_str()), "Metadata {key} is incorrect");
}

#[then(expr = "the generated order has status {word} and a royalty fee of {float}")]
async fn check_generated_order(world: &mut OrderWorld, status: String, royalty: f64) {
    let orders = world.orders().orders().await.expect("Error fetching orders");
    let order = orders.first().expect("No orders exist");
    assert!(order.id.as_str().starts_with("order-"), "Unexpected id {}", order.id);
    assert_eq!(order.status.to_string(), status);
    assert_eq!(order.royalty_fee, money(royalty));
}

#[then(expr = "the payment created a new order for {float} with a royalty fee of {float}")]
async fn check_order_from_payment(world: &mut OrderWorld, amount: f64, royalty: f64) {
    let outcome = world.last_outcome.as_ref().expect("No payment was reconciled");
    let ReconciliationOutcome::Created(order) = outcome else { panic!("No order was created. {outcome:?}") };
    assert_eq!(order.total_amount, money(amount));
    assert_eq!(order.royalty_fee, money(royalty));
    assert_eq!(order.payment_method, "stripe");
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[then(expr = "the new order has its own id and keeps {word} as its orderReference")]
async fn check_new_order_reference(world: &mut OrderWorld, reference: String) {
    let outcome = world.last_outcome.as_ref().expect("No payment was reconciled");
    let ReconciliationOutcome::Created(order) = outcome else { panic!("No order was created. {outcome:?}") };
    assert_ne!(order.id.as_str(), reference);
    assert_eq!(order.metadata_str("orderReference"), Some(reference.as_str()));
    assert!(world.orders().order_by_id(&OrderId::from(reference)).await.expect("Error fetching order").is_none());
}

#[then(expr = "the payment was {word}")]
async fn check_outcome(world: &mut OrderWorld, expected: String) {
    let outcome = world.last_outcome.as_ref().expect("No payment was reconciled");
    let actual = match outcome {
        ReconciliationOutcome::Updated(_) => "applied",
        ReconciliationOutcome::Created(_) => "recorded",
        ReconciliationOutcome::AlreadyProcessed(_) => "skipped",
        ReconciliationOutcome::Ignored => "ignored",
    };
    assert_eq!(actual, expected);
}

#[then(expr = "the request failed with {string}")]
async fn check_error(world: &mut OrderWorld, expected: String) {
    let err = world.last_error.as_ref().expect("The last request did not fail");
    let kind = match err {
        OrderFlowError::ValidationError(_) => "a validation error",
        OrderFlowError::OrderNotFound(_) => "an unknown order",
        OrderFlowError::InvalidStatusTransition { .. } => "an invalid transition",
        OrderFlowError::StoreError(_) => "a store error",
        OrderFlowError::ProviderError(_) => "a provider error",
    };
    assert_eq!(kind, expected, "{err}");
}

#[then(expr = "the request succeeded")]
async fn check_success(world: &mut OrderWorld) {
    assert!(world.last_error.is_none(), "The last request failed. {:?}", world.last_error);
}
