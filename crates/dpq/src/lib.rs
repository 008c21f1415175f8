//! Delayed priority queue: a durable, shared task queue backed by Redis,
//! with priority ordering, per-task and per-group delayed visibility,
//! at-least-once delivery via visibility timeouts and bounded retries, and
//! payload-keyed deduplication.
//!
//! All correctness-critical state transitions run as a single atomic Lua
//! script on the server ([`registrar`], [`engine`]) — the client ([`client`])
//! is a thin, typed layer over that script's seven operations.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod registrar;
pub mod store;

pub use client::{DpqClient, Handle};
pub use config::Config;
pub use engine::NO_GROUP_SENTINEL;
pub use error::DpqError;
