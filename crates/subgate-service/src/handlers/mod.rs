//! API handlers.

pub mod health;
pub mod subscription;
pub mod webhooks;
