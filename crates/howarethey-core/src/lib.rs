//! Core types and trait definitions for the HowAreThey reminder service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the friend record, the date rules, the weighted draw, and the service that
//! ties a [`store::FriendStore`] to a [`notify::Notifier`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod birthday;
pub mod date;
pub mod error;
pub mod friend;
pub mod memory;
pub mod notify;
pub mod select;
pub mod service;
pub mod store;

pub use error::{Error, Result};
