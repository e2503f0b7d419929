//! Durable storage for per-route commute history.
//!
//! One JSON document holds the whole store; it is loaded once at engine
//! start and rewritten whole after each completed poll cycle.

pub mod history;

pub use history::{HistoryEntry, HistoryStore, RouteHistory};
