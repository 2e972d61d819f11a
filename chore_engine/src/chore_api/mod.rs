//! # Order engine public API
//!
//! * [`order_flow_api`] is the order lifecycle service: it builds order records from submitted form data, applies the
//!   pricing and status defaults, and enforces the status state machine.
//! * [`reconciliation_api`] handles the payment side: it starts hosted checkouts for orders, and matches the
//!   provider's asynchronous payment notifications to local orders.
//!
//! Both APIs are created by supplying an [`OrderStore`](crate::traits::OrderStore) backend and the event producers
//! to notify.
//!
//! ```rust,ignore
//! use chore_engine::{events::EventProducers, JsonFileStore, OrderFlowApi};
//! let store = JsonFileStore::new("./data").await?;
//! let api = OrderFlowApi::new(store, EventProducers::default());
//! let orders = api.orders().await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod reconciliation_api;
