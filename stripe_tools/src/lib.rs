//! A small client for the parts of the Stripe API that the order server uses: hosted checkout sessions, payment
//! intents, refunds, and webhook signature verification.
mod api;
mod config;
mod error;

mod data_objects;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    CheckoutSession,
    CustomerDetails,
    EventData,
    NewCheckoutSession,
    PaymentIntent,
    Refund,
    StripeEvent,
    CHECKOUT_SESSION_COMPLETED,
    PAYMENT_INTENT_FAILED,
    PAYMENT_INTENT_SUCCEEDED,
};
pub use error::{SignatureError, StripeApiError};
