use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::{OrderStoreError, PaymentProviderError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} cannot move from {from} back to {to}")]
    InvalidStatusTransition { id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Order store error. {0}")]
    StoreError(OrderStoreError),
    #[error("{0}")]
    ProviderError(#[from] PaymentProviderError),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderStoreError::InvalidStatusTransition { id, from, to } => Self::InvalidStatusTransition { id, from, to },
            e => Self::StoreError(e),
        }
    }
}
