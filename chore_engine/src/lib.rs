//! Chore Engine
//!
//! The order engine behind the campus chore service. It keeps track of laundry orders from the moment they are placed
//! until the clean laundry is delivered, and reconciles them with payments taken through a hosted checkout page.
//!
//! The library is divided into three main sections:
//! 1. Order persistence ([`mod@db`] and the [`OrderStore`] trait). The bundled backend, [`JsonFileStore`], keeps every
//!    order in a single JSON document. The data types stored there live in [`db_types`].
//! 2. The public API ([`OrderFlowApi`] and [`ReconciliationApi`]). This is what servers should use. It applies
//!    defaults and pricing to submitted orders, enforces the status lifecycle, and matches payment notifications to
//!    orders.
//! 3. Payment provider contracts ([`traits::PaymentProvider`]). The engine does not talk to any payment company
//!    itself. Integrations implement this trait and hand the engine provider-agnostic [`traits::PaymentEvent`]s.
//!
//! The engine also emits events when orders are created, paid for, or change status. See [`events`] for how to hook
//! into them.
mod db;

mod chore_api;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use chore_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    reconciliation_api::{ReconciliationApi, PROCESSED_EVENTS_KEY},
};
pub use db::json_file::{JsonFileStore, DOCUMENT_NAME};
pub use traits::{OrderStore, OrderStoreError, PaymentProvider, PaymentProviderError};
