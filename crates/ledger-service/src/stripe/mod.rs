//! Stripe integration for credit top-ups.
//!
//! Stripe handles:
//! - Credit purchases via Checkout
//! - Webhook deliveries for payment events
//!
//! The rest of the service never touches raw Stripe payloads; the client
//! verifies each delivery and normalizes it to a [`GatewayEvent`].

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use types::{CheckoutSession, GatewayEvent};
