#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(clippy::module_name_repetitions)]

//! # WS Relay Server
//!
//! A minimal, in-memory WebSocket broadcast relay: every message a client
//! sends is fanned out, verbatim and best-effort, to all other connected
//! clients. No rooms, no persistence, no delivery guarantees.

/// Runtime configuration assembled from the command line
pub mod config;

/// Structured logging setup
pub mod logging;

/// Relay activity counters
pub mod metrics;

/// Opaque payloads and client identity
pub mod payload;

/// The live connection registry
pub mod registry;

/// Broadcast dispatch and connection lifecycle hooks
pub mod relay;

/// WebSocket connection handling and HTTP routes
pub mod websocket;
