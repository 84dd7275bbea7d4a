//! The two relay directions built on the envelope codec.

pub mod inbound;
pub mod outbound;

#[cfg(test)]
pub(crate) mod testing;

pub use inbound::{InboundOutcome, InboundRelay, SkipReason};
pub use outbound::OutboundRelay;
