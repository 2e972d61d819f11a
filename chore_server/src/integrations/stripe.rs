use chore_common::Money;
use chore_engine::traits::{
    CheckoutCompleted,
    CheckoutRequest,
    CheckoutSessionInfo,
    PaymentEvent,
    PaymentProvider,
    PaymentProviderError,
    PaymentStatus,
    RefundReceipt,
    SessionDetails,
};
use log::*;
use stripe_tools::{
    webhook::construct_event,
    NewCheckoutSession,
    SignatureError,
    StripeApi,
    StripeApiError,
    StripeConfig,
    StripeEvent,
    CHECKOUT_SESSION_COMPLETED,
    PAYMENT_INTENT_FAILED,
    PAYMENT_INTENT_SUCCEEDED,
};

pub const STRIPE_PROVIDER_NAME: &str = "stripe";

/// Hosted checkout through Stripe.
///
/// Checkout sessions need the secret API key and webhooks need the signing secret. Either can be missing; the
/// provider then refuses the affected calls with [`PaymentProviderError::NotConfigured`] instead of failing to start.
#[derive(Clone)]
pub struct StripeProvider {
    config: StripeConfig,
    api: Option<StripeApi>,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Self {
        let api = match StripeApi::new(config.clone()) {
            Ok(api) => Some(api),
            Err(e) => {
                warn!("💳️ Stripe checkout is disabled. {e}");
                None
            },
        };
        Self { config, api }
    }

    fn api(&self) -> Result<&StripeApi, PaymentProviderError> {
        self.api.as_ref().ok_or_else(|| PaymentProviderError::NotConfigured(StripeApiError::MissingSecretKey.to_string()))
    }
}

impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        STRIPE_PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        self.api.is_some()
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSessionInfo, PaymentProviderError> {
        let api = self.api()?;
        let session = NewCheckoutSession {
            amount_cents: request.amount.cents(),
            product_name: request.product_name,
            product_description: request.description,
            success_url: request.success_url,
            cancel_url: request.cancel_url,
            customer_email: request.customer_email,
            metadata: request.metadata,
        };
        let session = api.create_checkout_session(&session).await.map_err(upstream_error)?;
        Ok(CheckoutSessionInfo { session_id: session.id, url: session.url })
    }

    fn verify_and_parse_event(
        &self,
        payload: &[u8],
        signature: Option<String>,
    ) -> Result<PaymentEvent, PaymentProviderError> {
        let secret = self.config.webhook_secret.reveal();
        if secret.is_empty() {
            error!("💳️ A Stripe webhook arrived, but CHORE_STRIPE_WEBHOOK_SECRET is not set. Refusing it.");
            return Err(PaymentProviderError::NotConfigured(SignatureError::MissingSecret.to_string()));
        }
        let signature = signature.ok_or_else(|| {
            PaymentProviderError::SignatureVerificationFailed("The Stripe-Signature header is missing".to_string())
        })?;
        let event = construct_event(payload, &signature, secret, self.config.webhook_tolerance).map_err(|e| match e {
            SignatureError::InvalidPayload(_) => PaymentProviderError::InvalidEvent(e.to_string()),
            SignatureError::MissingSecret | SignatureError::InvalidSecret(_) => {
                PaymentProviderError::NotConfigured(e.to_string())
            },
            e => PaymentProviderError::SignatureVerificationFailed(e.to_string()),
        })?;
        trace!("💳️ Stripe event {} ({}) has a valid signature", event.id, event.event_type);
        payment_event_from_stripe(event)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetails, PaymentProviderError> {
        let session = self.api()?.get_checkout_session(session_id).await.map_err(upstream_error)?;
        let payment_status = if session.is_paid() {
            PaymentStatus::Paid
        } else {
            session.payment_status.as_deref().map(payment_status_from_stripe).unwrap_or_default()
        };
        Ok(SessionDetails {
            payment_id: session.payment_intent_id(),
            customer_name: session.customer_name().map(String::from),
            customer_email: session.email().map(String::from),
            amount_total: session.amount_total.map(Money::from_cents),
            payment_status,
            session_id: session.id,
            metadata: session.metadata,
        })
    }

    async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, PaymentProviderError> {
        let intent = self.api()?.get_payment_intent(payment_id).await.map_err(upstream_error)?;
        Ok(payment_status_from_stripe(&intent.status))
    }

    async fn issue_refund(
        &self,
        payment_id: &str,
        amount: Option<Money>,
    ) -> Result<RefundReceipt, PaymentProviderError> {
        let refund = self.api()?.create_refund(payment_id, amount.map(|a| a.cents())).await.map_err(upstream_error)?;
        Ok(RefundReceipt {
            refund_id: refund.id,
            payment_id: refund.payment_intent.unwrap_or_else(|| payment_id.to_string()),
            amount: Money::from_cents(refund.amount),
            status: refund.status,
        })
    }
}

fn upstream_error(e: StripeApiError) -> PaymentProviderError {
    warn!("💳️ Stripe API call failed. {e}");
    PaymentProviderError::UpstreamError(e.to_string())
}

/// Translates the Stripe statuses of both checkout sessions and payment intents.
fn payment_status_from_stripe(status: &str) -> PaymentStatus {
    match status {
        "paid" | "succeeded" | "no_payment_required" => PaymentStatus::Paid,
        "requires_capture" => PaymentStatus::Authorized,
        "canceled" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

pub fn payment_event_from_stripe(event: StripeEvent) -> Result<PaymentEvent, PaymentProviderError> {
    let invalid = |e: StripeApiError| PaymentProviderError::InvalidEvent(e.to_string());
    match event.event_type.as_str() {
        CHECKOUT_SESSION_COMPLETED => {
            let session = event.checkout_session().map_err(invalid)?;
            Ok(PaymentEvent::CheckoutCompleted(CheckoutCompleted {
                provider: STRIPE_PROVIDER_NAME.to_string(),
                event_id: event.id,
                payment_id: session.payment_intent_id(),
                customer_name: session.customer_name().map(String::from),
                customer_email: session.email().map(String::from),
                amount_total: session.amount_total.map(Money::from_cents),
                payment_status: session.payment_status.clone(),
                session_id: session.id,
                metadata: session.metadata,
            }))
        },
        PAYMENT_INTENT_SUCCEEDED => {
            let intent = event.payment_intent().map_err(invalid)?;
            Ok(PaymentEvent::PaymentSucceeded {
                event_id: event.id,
                payment_id: intent.id,
                amount: Some(Money::from_cents(intent.amount)),
            })
        },
        PAYMENT_INTENT_FAILED => {
            let intent = event.payment_intent().map_err(invalid)?;
            let reason = intent.failure_message().map(String::from);
            Ok(PaymentEvent::PaymentFailed { event_id: event.id, payment_id: intent.id, reason })
        },
        _ => Ok(PaymentEvent::Other { event_id: event.id, event_type: event.event_type.clone() }),
    }
}
