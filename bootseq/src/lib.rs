//! Idempotent environment bootstrap sequencer.
//!
//! Brings a fresh deployment of the stock analysis web application from
//! "nothing provisioned" to "ready to serve" by running a fixed list of steps
//! in order, each gated on the previous one. The architecture keeps a strict
//! separation:
//!
//! - **[`core`]**: Pure logic (step contract, sequencer, outcome types, secret
//!   generation). No filesystem, network, or process I/O.
//! - **[`io`]**: Side-effecting adapters (config, `.env`, TCP probe, child
//!   processes, prompts, run report) behind traits so tests can script them.
//!
//! [`steps`] defines the concrete steps, [`variant`] selects and orders them
//! per deployment variant, and [`bootstrap`] ties a run together for the CLI.

pub mod bootstrap;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod steps;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod variant;
