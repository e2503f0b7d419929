//! Travel-time polling and aggregation engine.
//!
//! Periodically measures travel-time estimates for a set of configured
//! routes from a directions provider, folds the samples into a durable
//! per-route history, and emits one consolidated batch per completed poll
//! cycle.
//!
//! # Architecture
//! - [`engine::Engine`]: root structure owning the shared history and the
//!   recurring-timer lifecycle; one instance per process
//! - [`poll`]: per-destination resolution and fan-out/fan-in of one cycle
//! - [`storage`]: durable per-route history with legacy-schema migration
//! - [`transport`]: HTTP seam to the directions provider
//!
//! Hosts feed [`types::PollRequest`] triggers into [`engine::Engine::run`]
//! and consume [`types::CycleBatch`] results; everything else is internal.

pub mod engine;
pub mod poll;
pub mod provider;
pub mod storage;
pub mod transport;
pub mod types;

pub use engine::{Engine, EngineConfig};
pub use storage::{HistoryEntry, HistoryStore, RouteHistory};
pub use transport::{HttpTransport, Transport, TransportOutcome};
pub use types::{
    CycleBatch, DestinationConfig, PollRequest, Prediction, RouteSummary, TransitLegInfo,
    TravelMode,
};
