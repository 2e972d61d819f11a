//! # Backend contracts
//!
//! The engine is agnostic about where orders are kept and which company processes payments. These traits define
//! what it needs from each.
//!
//! * [`OrderStore`] is the durable, keyed collection of order records. It owns the only persistent state in the
//!   system.
//! * [`PaymentProvider`] is a hosted-checkout payment processor. It creates payment sessions, authenticates and
//!   parses inbound notifications, and answers questions about payments it has processed.
mod data_objects;
mod order_store;
mod payment_provider;

pub use data_objects::{
    CheckoutCompleted,
    CheckoutRequest,
    CheckoutSessionInfo,
    PaymentEvent,
    PaymentStatus,
    RefundReceipt,
    SessionDetails,
};
pub use order_store::{OrderStore, OrderStoreError};
pub use payment_provider::{PaymentProvider, PaymentProviderError};
