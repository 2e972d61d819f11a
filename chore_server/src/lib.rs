//! # Chore order server
//!
//! The HTTP front of the campus chore service. It is responsible for:
//! * Accepting orders from the web form and storing them through the order engine.
//! * Creating hosted Stripe checkout pages for those orders.
//! * Receiving Stripe's payment notifications and reconciling them with the stored orders.
//! * Serving the order list and status updates to the vendor dashboard.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health` and `/api/health`: A health check that also lists the catalog ids.
//! * `/api/orders`: List (`GET`) and submit (`POST`) orders.
//! * `/api/orders/{id}`: Fetch a single order.
//! * `/api/orders/{id}/status`: Move an order along its lifecycle (`PUT`).
//! * `/api/create-checkout-session`: Create a hosted payment page.
//! * `/api/stripe-webhook`: Stripe payment notifications.
//! * `/api/services`, `/api/vendors`, `/api/payments/providers`: Catalog listings.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
