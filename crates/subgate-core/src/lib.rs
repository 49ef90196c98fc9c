//! Core types for subgate.
//!
//! This crate provides the foundational types shared by the subscription gateway:
//!
//! - **Identifiers**: `UserId`, `CustomerId`, `PriceId`, `SubscriptionId`
//! - **Principals**: `Principal`, the authenticated user behind a request

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod principal;

pub use ids::{CustomerId, IdError, PriceId, SubscriptionId, UserId};
pub use principal::Principal;
