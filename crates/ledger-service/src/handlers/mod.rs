//! API handlers.

// Allow precision loss in handlers - amounts displayed are well within f64 precision
#![allow(clippy::cast_precision_loss)]

pub mod billing;
pub mod health;
pub mod internal;
pub mod webhooks;
