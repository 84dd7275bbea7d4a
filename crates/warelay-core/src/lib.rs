//! Core of the WhatsApp ↔ Telegram customer-service relay.
//!
//! Telegram, the WhatsApp bridge and the HTTP messenger live behind ports
//! implemented in adapter crates; everything here is transport-agnostic.

pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod relay;
pub mod response;

pub use errors::{Error, Result};
