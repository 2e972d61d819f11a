//! Payment provider integrations.
//!
//! The server hands a single [`PaymentGateway`] to the checkout and webhook routes. [`PaymentProviders`] lists every
//! integration the deployment knows about, including ones that are not usable yet.
pub mod notifications;
pub mod stripe;

use chore_common::Money;
use chore_engine::traits::{
    CheckoutRequest,
    CheckoutSessionInfo,
    PaymentEvent,
    PaymentProvider,
    PaymentProviderError,
    PaymentStatus,
    RefundReceipt,
    SessionDetails,
};

pub use self::stripe::StripeProvider;
use crate::data_objects::ProviderInfo;

//--------------------------------------   UnavailableProvider   -----------------------------------------------------
/// A provider that is listed but not integrated. Every call fails with
/// [`PaymentProviderError::ProviderUnavailable`].
#[derive(Debug, Clone, Copy)]
pub struct UnavailableProvider {
    name: &'static str,
}

impl UnavailableProvider {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn unavailable(&self) -> PaymentProviderError {
        PaymentProviderError::ProviderUnavailable(self.name.to_string())
    }
}

impl PaymentProvider for UnavailableProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn create_checkout_session(&self, _: CheckoutRequest) -> Result<CheckoutSessionInfo, PaymentProviderError> {
        Err(self.unavailable())
    }

    fn verify_and_parse_event(&self, _: &[u8], _: Option<String>) -> Result<PaymentEvent, PaymentProviderError> {
        Err(self.unavailable())
    }

    async fn fetch_session(&self, _: &str) -> Result<SessionDetails, PaymentProviderError> {
        Err(self.unavailable())
    }

    async fn payment_status(&self, _: &str) -> Result<PaymentStatus, PaymentProviderError> {
        Err(self.unavailable())
    }

    async fn issue_refund(&self, _: &str, _: Option<Money>) -> Result<RefundReceipt, PaymentProviderError> {
        Err(self.unavailable())
    }
}

//--------------------------------------     PaymentGateway      -----------------------------------------------------
#[derive(Clone)]
pub enum PaymentGateway {
    Stripe(StripeProvider),
    Unavailable(UnavailableProvider),
}

impl PaymentProvider for PaymentGateway {
    fn name(&self) -> &'static str {
        match self {
            Self::Stripe(p) => p.name(),
            Self::Unavailable(p) => p.name(),
        }
    }

    fn is_available(&self) -> bool {
        match self {
            Self::Stripe(p) => p.is_available(),
            Self::Unavailable(p) => p.is_available(),
        }
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSessionInfo, PaymentProviderError> {
        match self {
            Self::Stripe(p) => p.create_checkout_session(request).await,
            Self::Unavailable(p) => p.create_checkout_session(request).await,
        }
    }

    fn verify_and_parse_event(
        &self,
        payload: &[u8],
        signature: Option<String>,
    ) -> Result<PaymentEvent, PaymentProviderError> {
        match self {
            Self::Stripe(p) => p.verify_and_parse_event(payload, signature),
            Self::Unavailable(p) => p.verify_and_parse_event(payload, signature),
        }
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetails, PaymentProviderError> {
        match self {
            Self::Stripe(p) => p.fetch_session(session_id).await,
            Self::Unavailable(p) => p.fetch_session(session_id).await,
        }
    }

    async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, PaymentProviderError> {
        match self {
            Self::Stripe(p) => p.payment_status(payment_id).await,
            Self::Unavailable(p) => p.payment_status(payment_id).await,
        }
    }

    async fn issue_refund(
        &self,
        payment_id: &str,
        amount: Option<Money>,
    ) -> Result<RefundReceipt, PaymentProviderError> {
        match self {
            Self::Stripe(p) => p.issue_refund(payment_id, amount).await,
            Self::Unavailable(p) => p.issue_refund(payment_id, amount).await,
        }
    }
}

//--------------------------------------    PaymentProviders     -----------------------------------------------------
/// Every payment integration the deployment knows about, looked up by name.
#[derive(Clone)]
pub struct PaymentProviders<P = PaymentGateway> {
    providers: Vec<P>,
}

impl<P> Default for PaymentProviders<P> {
    fn default() -> Self {
        Self { providers: Vec::new() }
    }
}

impl PaymentProviders<PaymentGateway> {
    /// Stripe, plus the Rozo integration that has not been built yet.
    pub fn with_stripe(stripe: StripeProvider) -> Self {
        Self::new(vec![PaymentGateway::Stripe(stripe), PaymentGateway::Unavailable(UnavailableProvider::new("rozo"))])
    }
}

impl<P: PaymentProvider> PaymentProviders<P> {
    pub fn new(providers: Vec<P>) -> Self {
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&P> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn info(&self) -> Vec<ProviderInfo> {
        self.providers.iter().map(|p| ProviderInfo { id: p.name().to_string(), available: p.is_available() }).collect()
    }
}
