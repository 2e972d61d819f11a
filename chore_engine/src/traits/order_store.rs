use thiserror::Error;

use crate::db_types::{Metadata, Order, OrderId, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} cannot move from {from} back to {to}")]
    InvalidStatusTransition { id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Could not access the order document. {0}")]
    PersistenceError(String),
}

/// Durable, crash-safe persistence of [`Order`] records, keyed by id.
///
/// Every mutating call must be durable (or have logged its failure to become so) before it returns, and mutations
/// must be serialised so that concurrent read-modify-write cycles cannot lose updates.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Inserts the order. If an order with the same id already exists, it is replaced, keeping the original
    /// `created_at` and merging the metadata (incoming keys win). `updated_at` is refreshed either way.
    ///
    /// Returns the order as stored.
    async fn create(&self, order: Order) -> Result<Order, OrderStoreError>;

    /// All orders, newest (by `created_at`) first.
    async fn find_all(&self) -> Result<Vec<Order>, OrderStoreError>;

    /// Returns `None` when there is no order with the given id.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Returns the first order whose metadata holds the string `value` under `key`.
    async fn find_by_metadata(&self, key: &str, value: &str) -> Result<Option<Order>, OrderStoreError>;

    /// Replaces the fields of an existing order. `created_at` is kept, metadata is merged and `updated_at` is
    /// refreshed. Fails with [`OrderStoreError::OrderNotFound`] if the order does not exist.
    async fn update(&self, order: Order) -> Result<Order, OrderStoreError>;

    /// Changes only the status (and `updated_at`) of an existing order.
    ///
    /// Status only moves forward. Moving backwards fails with [`OrderStoreError::InvalidStatusTransition`]. Setting
    /// the current status again changes nothing and returns the order as is.
    async fn update_status(&self, id: &OrderId, status: OrderStatusType) -> Result<Order, OrderStoreError>;

    /// Merges `patch` into the metadata of an existing order and refreshes `updated_at`.
    async fn merge_metadata(&self, id: &OrderId, patch: Metadata) -> Result<Order, OrderStoreError>;
}
