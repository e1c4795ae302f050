//! Deterministic logic for the bootstrap sequence.
//!
//! Core modules do no filesystem, network, or process I/O. Steps that need
//! those capabilities receive them through traits defined in [`crate::io`].

pub mod context;
pub mod error;
pub mod secret;
pub mod sequencer;
pub mod types;
