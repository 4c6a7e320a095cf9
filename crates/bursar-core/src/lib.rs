//! Core types and trait definitions for the Bursar program registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// Backend traits return explicit `impl Future + Send` so implementations can
// use native `async fn` (stabilised in Rust 1.75) without losing `Send`.
#![allow(async_fn_in_trait)]

pub mod allocate;
pub mod application;
pub mod archive;
pub mod company;
pub mod error;
pub mod facility;
pub mod store;

pub use error::{Error, Result};
