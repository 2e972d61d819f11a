use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest};
use chore_engine::traits::OrderStoreError;
use serde_json::json;

use super::{
    helpers::{json, send_request, TestStore},
    mocks::{idle_gateway, MockOrderDb},
};

async fn submit(store: &TestStore, order: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let req = TestRequest::post().uri("/api/orders").set_json(order);
    let (status, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    (status, json(&body))
}

async fn set_status(store: &TestStore, id: &str, status: &str) -> (StatusCode, serde_json::Value) {
    let req = TestRequest::put().uri(&format!("/api/orders/{id}/status")).set_json(json!({ "status": status }));
    let (status, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    (status, json(&body))
}

#[actix_web::test]
async fn submitted_orders_get_defaults() {
    let store = TestStore::new().await;
    let (status, order) = submit(&store, json!({"basePrice": 28, "name": "Jane Doe", "room": "12B"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["customerName"], "Jane Doe");
    assert_eq!(order["roomOrLocation"], "12B");
    assert_eq!(order["serviceDescription"], "Laundry – 14kg Mixed Load");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["paymentMethod"], "cash");
    assert_eq!(order["totalAmount"], 28.0);
    assert_eq!(order["amountPaid"], 28.0);
    assert_eq!(order["royaltyFee"], 4.2);
    assert_eq!(order["tipAmount"], 0.0);
    let id = order["id"].as_str().unwrap();
    assert!(id.starts_with("order-"), "Unexpected id {id}");

    let req = TestRequest::get().uri(&format!("/api/orders/{id}"));
    let (status, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), order);
}

#[actix_web::test]
async fn order_references_become_ids() {
    let store = TestStore::new().await;
    let order = json!({
        "orderReference": "order-1718",
        "customerName": "Sam",
        "totalAmount": "17.50",
        "royaltyFee": 1,
        "paymentMethod": "stripe",
        "email": "sam@example.com",
        "pickupWindow": "morning"
    });
    let (status, order) = submit(&store, order).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["id"], "order-1718");
    assert_eq!(order["customerName"], "Sam");
    assert_eq!(order["roomOrLocation"], "Unknown");
    assert_eq!(order["totalAmount"], 17.5);
    assert_eq!(order["royaltyFee"], 1.0);
    assert_eq!(order["paymentMethod"], "stripe");
    assert_eq!(order["metadata"]["customerEmail"], "sam@example.com");
    assert_eq!(order["metadata"]["pickupWindow"], "morning");
}

#[actix_web::test]
async fn orders_need_an_amount() {
    let store = TestStore::new().await;
    let (status, body) = submit(&store, json!({"name": "Jane Doe"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Total amount is required"}));
    let (status, body) = submit(&store, json!({"totalAmount": -5})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cannot be negative"));

    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"name\": ");
    let (status, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));

    let (status, body) = send_request(store.store.clone(), idle_gateway(), TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!([]));
}

#[actix_web::test]
async fn unknown_orders() {
    let store = TestStore::new().await;
    let req = TestRequest::get().uri("/api/orders/order-404");
    let (status, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "The data was not found. Order #order-404 does not exist");
    let (status, _) = set_status(&store, "order-404", "Delivered").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn newest_orders_come_first() {
    let store = TestStore::new().await;
    for reference in ["order-a", "order-b", "order-c"] {
        let (status, _) = submit(&store, json!({"orderReference": reference, "basePrice": 15})).await;
        assert_eq!(status, StatusCode::CREATED);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Resubmitting an order replaces it rather than adding a second one
    let (status, _) = submit(&store, json!({"orderReference": "order-a", "basePrice": 20})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send_request(store.store.clone(), idle_gateway(), TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json(&body);
    let ids = orders.as_array().unwrap().iter().map(|o| o["id"].as_str().unwrap().to_string()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["order-c", "order-b", "order-a"]);
    assert_eq!(orders[2]["totalAmount"], 20.0);
}

#[actix_web::test]
async fn status_lifecycle() {
    let store = TestStore::new().await;
    let (_, order) = submit(&store, json!({"orderReference": "order-9", "basePrice": 15})).await;
    assert_eq!(order["status"], "Pending");

    let (status, order) = set_status(&store, "order-9", "Picked Up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "PickedUp");
    let (status, order) = set_status(&store, "order-9", "PickedUp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "PickedUp");
    let (status, order) = set_status(&store, "order-9", "Delivered").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Delivered");

    let (status, body) = set_status(&store, "order-9", "Pending").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Order #order-9 cannot move from Delivered back to Pending");

    let (status, body) = set_status(&store, "order-9", "Completed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status. Valid values are: Pending, PickedUp, Delivered");
    let req = TestRequest::put().uri("/api/orders/order-9/status").set_json(json!({}));
    let (status, _) = send_request(store.store.clone(), idle_gateway(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::get().uri("/api/orders/order-9");
    let (_, body) = send_request(store.store.clone(), idle_gateway(), req).await;
    assert_eq!(json(&body)["status"], "Delivered");
}

#[actix_web::test]
async fn store_failures_are_server_errors() {
    let mut db = MockOrderDb::new();
    db.expect_clone().returning(|| {
        let mut db = MockOrderDb::new();
        db.expect_find_all().returning(|| Err(OrderStoreError::PersistenceError("disk full".into())));
        db
    });
    let (status, body) = send_request(db, idle_gateway(), TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("disk full"));
}
