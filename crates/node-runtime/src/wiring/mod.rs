//! # Client Wiring
//!
//! The single dispatch loop that drives the coordinator: connection tasks and
//! timers post events, the loop applies them one at a time and executes the
//! resulting actions.

pub mod client_driver;

pub use client_driver::{run_client, run_client_with, ClientRunSummary, TimerSet};
