//! A single-document JSON order store.
//!
//! The full order collection lives in memory behind an async `RwLock`. Every mutation takes the write lock, applies
//! the change, and writes the whole collection to `<data dir>/orders.json` before releasing the lock, so concurrent
//! read-modify-write cycles are serialised and the document on disk always reflects a complete state.
//!
//! If writing the document fails, the error is logged and the change is kept in memory. The next successful write
//! persists it.
mod document;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use log::*;
use tokio::sync::RwLock;

use crate::{
    db_types::{merge_metadata, Metadata, Order, OrderId, OrderStatusType},
    traits::{OrderStore, OrderStoreError},
};

pub const DOCUMENT_NAME: &str = "orders.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: Arc<PathBuf>,
    orders: Arc<RwLock<Vec<Order>>>,
}

impl JsonFileStore {
    /// Opens the order document in `data_dir`, creating the directory and an empty document if necessary.
    pub async fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, OrderStoreError> {
        let path = data_dir.as_ref().join(DOCUMENT_NAME);
        let load_path = path.clone();
        let orders = tokio::task::spawn_blocking(move || document::load_document(&load_path))
            .await
            .map_err(|e| OrderStoreError::PersistenceError(e.to_string()))??;
        info!("🗃️ Loaded {} orders from {}", orders.len(), path.display());
        Ok(Self { path: Arc::new(path), orders: Arc::new(RwLock::new(orders)) })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Writes the collection to disk. Must be called while holding the write lock.
    async fn persist(&self, orders: &[Order]) {
        let contents = match serde_json::to_vec_pretty(orders) {
            Ok(c) => c,
            Err(e) => {
                error!("🗃️ Could not serialize the order collection. The change is only held in memory. {e}");
                return;
            },
        };
        let path = Arc::clone(&self.path);
        match tokio::task::spawn_blocking(move || document::write_document(&path, &contents)).await {
            Ok(Ok(())) => trace!("🗃️ Saved {} orders to {}", orders.len(), self.path.display()),
            Ok(Err(e)) => error!("🗃️ Could not save orders. The change is only held in memory. {e}"),
            Err(e) => error!("🗃️ The order save task failed. The change is only held in memory. {e}"),
        }
    }

    /// Replaces `existing` with `incoming`, keeping the original creation time, merging the metadata, and never
    /// moving the status backwards.
    fn replace(existing: &mut Order, incoming: Order) {
        let created_at = existing.created_at;
        let status = existing.status.max(incoming.status);
        let mut metadata = std::mem::take(&mut existing.metadata);
        merge_metadata(&mut metadata, incoming.metadata.clone());
        *existing = Order { created_at, updated_at: Utc::now().max(created_at), status, metadata, ..incoming };
    }
}

impl OrderStore for JsonFileStore {
    async fn create(&self, order: Order) -> Result<Order, OrderStoreError> {
        let mut orders = self.orders.write().await;
        let stored = match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => {
                debug!("🗃️ Order {} already exists. Replacing it.", order.id);
                Self::replace(existing, order);
                existing.clone()
            },
            None => {
                let mut order = order;
                order.updated_at = order.updated_at.max(order.created_at);
                debug!("🗃️ Inserting order {}", order.id);
                orders.push(order.clone());
                order
            },
        };
        self.persist(&orders).await;
        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<Order>, OrderStoreError> {
        let mut result = self.orders.read().await.clone();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        Ok(self.orders.read().await.iter().find(|o| &o.id == id).cloned())
    }

    async fn find_by_metadata(&self, key: &str, value: &str) -> Result<Option<Order>, OrderStoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.metadata_str(key) == Some(value)).cloned())
    }

    async fn update(&self, order: Order) -> Result<Order, OrderStoreError> {
        let mut orders = self.orders.write().await;
        let existing = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| OrderStoreError::OrderNotFound(order.id.clone()))?;
        Self::replace(existing, order);
        let updated = existing.clone();
        self.persist(&orders).await;
        Ok(updated)
    }

    async fn update_status(&self, id: &OrderId, status: OrderStatusType) -> Result<Order, OrderStoreError> {
        let mut orders = self.orders.write().await;
        let existing =
            orders.iter_mut().find(|o| &o.id == id).ok_or_else(|| OrderStoreError::OrderNotFound(id.clone()))?;
        if existing.status == status {
            trace!("🗃️ Order {id} is already {status}");
            return Ok(existing.clone());
        }
        if !existing.status.can_transition_to(status) {
            return Err(OrderStoreError::InvalidStatusTransition { id: id.clone(), from: existing.status, to: status });
        }
        debug!("🗃️ Order {id} status {} -> {status}", existing.status);
        existing.status = status;
        existing.updated_at = Utc::now().max(existing.created_at);
        let updated = existing.clone();
        self.persist(&orders).await;
        Ok(updated)
    }

    async fn merge_metadata(&self, id: &OrderId, patch: Metadata) -> Result<Order, OrderStoreError> {
        let mut orders = self.orders.write().await;
        let existing =
            orders.iter_mut().find(|o| &o.id == id).ok_or_else(|| OrderStoreError::OrderNotFound(id.clone()))?;
        existing.merge_metadata(patch);
        existing.updated_at = Utc::now().max(existing.created_at);
        let updated = existing.clone();
        self.persist(&orders).await;
        Ok(updated)
    }
}
