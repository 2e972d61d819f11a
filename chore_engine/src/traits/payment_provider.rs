use chore_common::Money;
use thiserror::Error;

use crate::traits::{CheckoutRequest, CheckoutSessionInfo, PaymentEvent, PaymentStatus, RefundReceipt, SessionDetails};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentProviderError {
    #[error("Payment provider {0} is not available")]
    ProviderUnavailable(String),
    #[error("Payment provider is not configured. {0}")]
    NotConfigured(String),
    #[error("Webhook signature verification failed. {0}")]
    SignatureVerificationFailed(String),
    #[error("The webhook payload could not be understood. {0}")]
    InvalidEvent(String),
    #[error("The payment provider returned an error. {0}")]
    UpstreamError(String),
}

/// A hosted-checkout payment processor.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Short, lowercase name. It is recorded as the payment method of orders paid through this provider.
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    /// Creates a hosted payment page for the amount in the request.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSessionInfo, PaymentProviderError>;

    /// Authenticates an inbound notification against the **raw** request body and parses it.
    ///
    /// `signature` is the value of the provider's signature header, if the request had one.
    fn verify_and_parse_event(&self, payload: &[u8], signature: Option<String>)
        -> Result<PaymentEvent, PaymentProviderError>;

    /// Looks up a checkout session's paid amount and customer details.
    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetails, PaymentProviderError>;

    async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, PaymentProviderError>;

    /// Refunds `amount`, or the whole payment if `amount` is `None`.
    async fn issue_refund(&self, payment_id: &str, amount: Option<Money>)
        -> Result<RefundReceipt, PaymentProviderError>;
}
