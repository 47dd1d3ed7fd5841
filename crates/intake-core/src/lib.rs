//! Core types and trait definitions for the lead intake service.
//!
//! This crate is deliberately free of HTTP, SQL and mail transport
//! dependencies. Every other crate in the workspace depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod layout;
pub mod mail;
pub mod record;
pub mod store;
pub mod validate;

pub use error::{Field, FieldViolation, ValidationError};
