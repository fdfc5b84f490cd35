//! LED group manager library.
//!
//! Turns concurrently-held, named group requests into a conflict-free,
//! minimal set of physical LED writes, and persists group intent across
//! restarts.  Exposes the pure-logic modules for integration testing;
//! the daemon in `main.rs` only wires adapters together.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod layout;
pub mod manager;

pub use error::{Error, Result};
