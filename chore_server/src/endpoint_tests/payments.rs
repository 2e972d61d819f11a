use actix_web::{http::StatusCode, test::TestRequest};
use chore_common::Money;
use chore_engine::traits::{CheckoutSessionInfo, PaymentProviderError};
use chrono::Utc;
use serde_json::{json, Value};
use stripe_tools::{
    webhook::{signature_header, SIGNATURE_HEADER},
    StripeConfig,
};

use super::{
    helpers::{json, send_request, send_request_with_options, TestStore},
    mocks::{idle_gateway, MockGateway},
};
use crate::{
    config::{Environment, ServerOptions},
    integrations::{PaymentGateway, StripeProvider, UnavailableProvider},
};

const SECRET: &str = "whsec_endpoint_tests";

fn stripe() -> PaymentGateway {
    PaymentGateway::Stripe(StripeProvider::new(StripeConfig::default().with_webhook_secret(SECRET)))
}

fn completed_event(event_id: &str, session_id: &str, metadata: Value) -> String {
    json!({
        "id": event_id,
        "object": "event",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": {
            "id": session_id,
            "object": "checkout.session",
            "amount_total": 2800,
            "currency": "usd",
            "customer_details": { "name": "Jane Doe", "email": "jane@example.com" },
            "metadata": metadata,
            "payment_intent": "pi_3PxS2a",
            "payment_status": "paid",
            "status": "complete"
        }}
    })
    .to_string()
}

fn webhook(payload: &str) -> TestRequest {
    let header = signature_header(payload.as_bytes(), SECRET, Utc::now().timestamp()).unwrap();
    TestRequest::post()
        .uri("/api/stripe-webhook")
        .insert_header((SIGNATURE_HEADER, header))
        .set_payload(payload.to_string())
}

async fn all_orders(store: &TestStore) -> Vec<Value> {
    let (status, body) = send_request(store.store.clone(), stripe(), TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::OK);
    json(&body).as_array().cloned().unwrap_or_default()
}

#[actix_web::test]
async fn payment_without_an_order_creates_one() {
    let store = TestStore::new().await;
    let payload = completed_event("evt_1", "cs_test_1", json!({"room": "12B", "service": "Wash & Fold"}));
    let (status, body) = send_request(store.store.clone(), stripe(), webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"received": true}));

    let orders = all_orders(&store).await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["customerName"], "Jane Doe");
    assert_eq!(order["roomOrLocation"], "12B");
    assert_eq!(order["serviceDescription"], "Wash & Fold");
    assert_eq!(order["amountPaid"], 28.0);
    assert_eq!(order["royaltyFee"], 2.8);
    assert_eq!(order["paymentMethod"], "stripe");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["metadata"]["checkoutSessionId"], "cs_test_1");
    assert_eq!(order["metadata"]["paymentIntentId"], "pi_3PxS2a");
}

#[actix_web::test]
async fn payment_confirms_the_submitted_order() {
    let store = TestStore::new().await;
    let req = TestRequest::post().uri("/api/orders").set_json(json!({
        "orderReference": "order-77",
        "name": "Jane Doe",
        "room": "12B",
        "basePrice": 28,
        "paymentMethod": "stripe",
        "notes": "leave at door"
    }));
    let (status, _) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::CREATED);

    let payload = completed_event("evt_2", "cs_test_2", json!({"orderReference": "order-77", "room": "12B"}));
    let (status, _) = send_request(store.store.clone(), stripe(), webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let orders = all_orders(&store).await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["id"], "order-77");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["royaltyFee"], 4.2);
    assert_eq!(order["metadata"]["notes"], "leave at door");
    assert_eq!(order["metadata"]["checkoutSessionId"], "cs_test_2");
    assert_eq!(order["metadata"]["customerEmail"], "jane@example.com");
    assert_eq!(order["metadata"]["paymentStatus"], "paid");
    assert!(order["metadata"]["paidAt"].is_string());
}

#[actix_web::test]
async fn order_forms_cannot_claim_payments() {
    let store = TestStore::new().await;
    let req = TestRequest::post().uri("/api/orders").set_json(json!({
        "name": "Mallory",
        "totalAmount": 1,
        "orderReference": "claimed",
        "checkoutSessionId": "cs_test_other",
        "providerEventIds": ["evt_other"],
        "paymentIntentId": "pi_other",
        "paidAt": "2024-06-01T10:00:00Z"
    }));
    let (status, body) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["metadata"], json!({}));

    let payload = completed_event("evt_other", "cs_test_other", json!({"room": "4C"}));
    let (status, _) = send_request(store.store.clone(), stripe(), webhook(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let orders = all_orders(&store).await;
    assert_eq!(orders.len(), 2);
    let claimed = orders.iter().find(|o| o["id"] == "claimed").unwrap();
    assert_eq!(claimed["amountPaid"], 1.0);
    assert_eq!(claimed["metadata"], json!({}));
    let paid = orders.iter().find(|o| o["id"] != "claimed").unwrap();
    assert_eq!(paid["customerName"], "Jane Doe");
    assert_eq!(paid["amountPaid"], 28.0);
    assert_eq!(paid["metadata"]["checkoutSessionId"], "cs_test_other");
}

#[actix_web::test]
async fn payment_for_an_unknown_reference_gets_a_fresh_id() {
    let store = TestStore::new().await;
    let payload = completed_event("evt_10", "cs_test_10", json!({"orderReference": "order-404"}));
    for _ in 0..2 {
        let (status, _) = send_request(store.store.clone(), stripe(), webhook(&payload)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let orders = all_orders(&store).await;
    assert_eq!(orders.len(), 1);
    assert_ne!(orders[0]["id"], "order-404");
    assert_eq!(orders[0]["metadata"]["orderReference"], "order-404");
    let req = TestRequest::get().uri("/api/orders/order-404");
    let (status, _) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn redelivered_notifications_change_nothing() {
    let store = TestStore::new().await;
    let payload = completed_event("evt_3", "cs_test_3", json!({}));
    for _ in 0..3 {
        let (status, body) = send_request(store.store.clone(), stripe(), webhook(&payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), json!({"received": true}));
    }
    let orders = all_orders(&store).await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["metadata"]["providerEventIds"], json!(["evt_3"]));
}

#[actix_web::test]
async fn unsigned_or_forged_notifications_are_rejected() {
    let store = TestStore::new().await;
    let payload = completed_event("evt_4", "cs_test_4", json!({}));

    let req = TestRequest::post().uri("/api/stripe-webhook").set_payload(payload.clone());
    let (status, body) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Webhook signature verification failed"));

    let forged = signature_header(payload.as_bytes(), "whsec_forged", Utc::now().timestamp()).unwrap();
    let req = TestRequest::post()
        .uri("/api/stripe-webhook")
        .insert_header((SIGNATURE_HEADER, forged))
        .set_payload(payload.clone());
    let (status, _) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = signature_header(payload.as_bytes(), SECRET, Utc::now().timestamp() - 3600).unwrap();
    let req = TestRequest::post()
        .uri("/api/stripe-webhook")
        .insert_header((SIGNATURE_HEADER, stale))
        .set_payload(payload.clone());
    let (status, _) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A signature over a different body
    let mut req = webhook(&completed_event("evt_5", "cs_test_5", json!({})));
    req = req.set_payload(payload);
    let (status, _) = send_request(store.store.clone(), stripe(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(all_orders(&store).await.is_empty());
}

#[actix_web::test]
async fn webhooks_need_a_signing_secret() {
    let store = TestStore::new().await;
    let unconfigured = PaymentGateway::Stripe(StripeProvider::new(StripeConfig::default()));
    let payload = completed_event("evt_6", "cs_test_6", json!({}));
    let (status, body) = send_request(store.store.clone(), unconfigured, webhook(&payload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Invalid server configuration"));
    assert!(all_orders(&store).await.is_empty());
}

#[actix_web::test]
async fn other_events_are_acknowledged() {
    let store = TestStore::new().await;
    let payloads = [
        json!({"id": "evt_7", "type": "payment_intent.succeeded", "data": {"object": {"id": "pi_7", "status": "succeeded", "amount": 2800}}}),
        json!({"id": "evt_8", "type": "payment_intent.payment_failed", "data": {"object": {"id": "pi_8", "status": "requires_payment_method", "amount": 2800}}}),
        json!({"id": "evt_9", "type": "customer.created", "data": {"object": {"id": "cus_9"}}}),
    ];
    for payload in payloads {
        let (status, body) = send_request(store.store.clone(), stripe(), webhook(&payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), json!({"received": true}));
    }
    assert!(all_orders(&store).await.is_empty());
}

#[actix_web::test]
async fn checkout_sessions() {
    let store = TestStore::new().await;
    let req = TestRequest::post().uri("/api/orders").set_json(json!({"orderReference": "order-88", "basePrice": 28}));
    let (status, _) = send_request(store.store.clone(), idle_gateway(), req).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut gateway = MockGateway::new();
    gateway.expect_name().return_const("stripe");
    gateway.expect_is_available().return_const(true);
    gateway
        .expect_create_checkout_session()
        .withf(|req| {
            req.amount == Money::from_cents(2800) &&
                req.product_name == "Standard Laundry Service" &&
                req.description.as_deref() == Some("Laundry service for Jane (Room: 12B)") &&
                req.success_url == "https://yourchore.com/thankyou" &&
                req.cancel_url == "http://localhost:5173/laundry" &&
                req.order_reference() == Some("order-88")
        })
        .times(1)
        .returning(|_| {
            Ok(CheckoutSessionInfo { session_id: "cs_test_88".into(), url: Some("https://checkout/cs_test_88".into()) })
        });
    let req = TestRequest::post().uri("/api/create-checkout-session").set_json(json!({
        "price": 28,
        "name": "Jane",
        "room": "12B",
        "email": "jane@example.com",
        "successUrl": "https://yourchore.com/thankyou",
        "orderReference": "order-88"
    }));
    let (status, body) = send_request(store.store.clone(), gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"sessionId": "cs_test_88", "url": "https://checkout/cs_test_88"}));

    let req = TestRequest::get().uri("/api/orders/order-88");
    let (_, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    let order = json(&body);
    assert_eq!(order["metadata"]["checkoutSessionId"], "cs_test_88");
    assert_eq!(order["metadata"]["checkoutInitiated"], true);
}

#[actix_web::test]
async fn checkout_errors() {
    let store = TestStore::new().await;
    let req = || TestRequest::post().uri("/api/create-checkout-session").set_json(json!({"amount": 15, "name": "Sam"}));

    let rozo = PaymentGateway::Unavailable(UnavailableProvider::new("rozo"));
    let (status, body) = send_request(store.store.clone(), rozo, req()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["error"], "Payment provider rozo is not available");

    let free = TestRequest::post().uri("/api/create-checkout-session").set_json(json!({"name": "Sam"}));
    let (status, _) = send_request(store.store.clone(), idle_gateway(), free).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let failing = || {
        let mut gateway = idle_gateway();
        gateway
            .expect_create_checkout_session()
            .returning(|_| Err(PaymentProviderError::UpstreamError("Invalid API Key provided: sk_live_****1234".into())));
        gateway
    };
    let (status, body) = send_request(store.store.clone(), failing(), req()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Invalid API Key provided"));

    let production = ServerOptions { environment: Environment::Production, ..Default::default() };
    let (status, body) = send_request_with_options(store.store.clone(), failing(), production, req()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("sk_live"));
    assert_eq!(json(&body)["error"], "The payment provider returned an error. Failed to create checkout session");
}
