//! Shared types for the polling engine.
//!
//! Field names on the serde derives match what the display layer consumes
//! (`timeInTraffic`, `error_msg`, ...), so emitted batches can be forwarded
//! verbatim.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Provider travel mode for a destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn is_transit(&self) -> bool {
        matches!(self, TravelMode::Transit)
    }
}

/// One configured route to be measured each poll cycle.
///
/// Identity is the label; labels are unique within one cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationConfig {
    /// Fully-built provider request URL
    pub url: String,

    /// Display label, also the history key
    pub label: String,

    /// Travel mode; defaults to driving when absent from the config
    #[serde(default)]
    pub mode: TravelMode,

    /// Transit display option: surface the next vehicle departure time
    #[serde(default)]
    pub show_next_vehicle_departure: bool,
}

/// One transit leg surfaced for a transit-mode destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitLegInfo {
    /// Line short name, falling back to the full line name
    pub route_label: String,

    /// Provider vehicle type (BUS, SUBWAY, ...)
    pub vehicle: String,

    /// Next departure as epoch milliseconds. Attached only to the first
    /// transit step, and only when the destination requests it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<u64>,
}

/// One route option returned by the provider for a destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Human-readable route summary ("I-95 S")
    pub summary: String,

    /// Baseline duration of the first leg, seconds
    pub time: u64,

    /// Traffic-adjusted duration of the first leg, seconds
    #[serde(rename = "timeInTraffic", skip_serializing_if = "Option::is_none")]
    pub time_in_traffic: Option<u64>,

    /// Transit legs scanned from the first leg's steps (transit mode only)
    #[serde(rename = "transitInfo", skip_serializing_if = "Option::is_none")]
    pub transit_info: Option<Vec<TransitLegInfo>>,
}

/// Resolved outcome of polling one destination in one cycle.
///
/// Either `routes` is non-empty with `error` unset, or `error` is set with a
/// readable `error_msg`. The transit data-quality case keeps already-built
/// routes alongside `error`; such predictions never reach the history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    /// The originating destination descriptor
    pub config: DestinationConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSummary>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl Prediction {
    /// Error prediction carrying no routes.
    pub fn failure(config: &DestinationConfig, message: String) -> Self {
        Prediction {
            config: config.clone(),
            routes: Vec::new(),
            error: true,
            error_msg: Some(message),
        }
    }
}

/// Inbound trigger payload: the destination set for one engine instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    pub destinations: Vec<DestinationConfig>,

    /// Recurring poll interval, milliseconds
    pub poll_frequency: u64,

    /// Tag echoed on every emitted batch so hosts running several engine
    /// instances can route results to the right consumer
    pub instance_id: String,
}

/// Consolidated result of one completed poll cycle.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleBatch {
    pub instance_id: String,

    /// One prediction per destination, ordered by destination index
    pub predictions: Vec<Prediction>,

    /// Snapshot of the historical store taken at cycle completion
    pub commute_data: crate::storage::HistoryStore,
}
