//! Core domain + application logic for the ProZorro tender bot.
//!
//! Framework-free: the registry HTTP client and
//! Telegram live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod pagination;
pub mod pipeline;
pub mod ports;
pub mod scheduler;
pub mod service;
pub mod tender;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
