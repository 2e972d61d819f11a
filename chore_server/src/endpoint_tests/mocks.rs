use chore_common::Money;
use chore_engine::{
    db_types::{Metadata, Order, OrderId, OrderStatusType},
    traits::{
        CheckoutRequest,
        CheckoutSessionInfo,
        OrderStore,
        OrderStoreError,
        PaymentEvent,
        PaymentProvider,
        PaymentProviderError,
        PaymentStatus,
        RefundReceipt,
        SessionDetails,
    },
};
use mockall::mock;

mock! {
    pub OrderDb {}
    impl Clone for OrderDb {
        fn clone(&self) -> Self;
    }
    impl OrderStore for OrderDb {
        async fn create(&self, order: Order) -> Result<Order, OrderStoreError>;
        async fn find_all(&self) -> Result<Vec<Order>, OrderStoreError>;
        async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn find_by_metadata(&self, key: &str, value: &str) -> Result<Option<Order>, OrderStoreError>;
        async fn update(&self, order: Order) -> Result<Order, OrderStoreError>;
        async fn update_status(&self, id: &OrderId, status: OrderStatusType) -> Result<Order, OrderStoreError>;
        async fn merge_metadata(&self, id: &OrderId, patch: Metadata) -> Result<Order, OrderStoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentProvider for Gateway {
        fn name(&self) -> &'static str;
        fn is_available(&self) -> bool;
        async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSessionInfo, PaymentProviderError>;
        fn verify_and_parse_event(&self, payload: &[u8], signature: Option<String>) -> Result<PaymentEvent, PaymentProviderError>;
        async fn fetch_session(&self, session_id: &str) -> Result<SessionDetails, PaymentProviderError>;
        async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, PaymentProviderError>;
        async fn issue_refund(&self, payment_id: &str, amount: Option<Money>) -> Result<RefundReceipt, PaymentProviderError>;
    }
}

/// A provider that must not be called at all.
pub fn idle_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_name().return_const("stripe");
    gateway.expect_is_available().return_const(true);
    gateway
}
