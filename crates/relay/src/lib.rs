//! # ZapRelay Relay
//!
//! The intake and dispatch core. [`Relay`] owns every piece of shared
//! state (duplicate filter, policy store, history buffers) and turns one
//! [`InboundEvent`](zaprelay_core::InboundEvent) into one [`Outcome`].
//!
//! - `dedup`: at-most-once reaction per gateway event id
//! - `media`: voice notes and images to text
//! - `gate`: suppress, decline, or proceed
//! - `bridge`: bounded call into the reasoning agent
//! - `delivery`: seen, typing, send, log

pub mod bridge;
pub mod dedup;
pub mod delivery;
pub mod gate;
pub mod media;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use bridge::{OrchestratorBridge, default_persona};
pub use dedup::DuplicateFilter;
pub use delivery::Delivery;
pub use gate::{Decision, DispatchGate, GateInput, SuppressReason, should_respond};
pub use media::MediaResolver;
pub use pipeline::{Collaborators, MEDIA_FAILURE_MOTIVO, Outcome, Relay};
