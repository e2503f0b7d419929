//! Durable per-route history of commute duration samples.
//!
//! Stored as a single JSON document keyed by route label:
//!
//! ```json
//! {"Work": {"time": 600, "data": [[1628313600, 700]]}}
//! ```
//!
//! Earlier deployments stored each route as an array of
//! `[dayLabel, "HH:mm", duration]` tuples; those are migrated on load.

use chrono::{Local, NaiveTime};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One durable sample: `[unix_timestamp_seconds, duration_seconds]`.
///
/// The tuple layout matches the on-disk array form exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry(pub u64, pub u64);

impl HistoryEntry {
    pub fn new(timestamp: u64, duration: u64) -> Self {
        HistoryEntry(timestamp, duration)
    }

    pub fn timestamp(&self) -> u64 {
        self.0
    }

    pub fn duration(&self) -> u64 {
        self.1
    }
}

/// Sampled time series for one route.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHistory {
    /// Most recent raw baseline duration, seconds. 0 until the first sample
    /// lands, and 0 for routes migrated from the legacy schema (the legacy
    /// baseline is not recoverable).
    pub time: u64,

    /// Samples in append order; never shrinks.
    pub data: Vec<HistoryEntry>,
}

/// On-disk value schema for one route: current object form or the legacy
/// array-of-tuples form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRoute {
    Current(RouteHistory),
    Legacy(Vec<LegacyEntry>),
}

/// Legacy tuple: `[dayLabel, "HH:mm", duration_seconds]`.
#[derive(Debug, Deserialize)]
struct LegacyEntry(String, String, u64);

/// Mapping from route label to its sampled history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStore {
    #[serde(flatten)]
    routes: HashMap<String, RouteHistory>,
}

impl HistoryStore {
    /// Load the store from `path`.
    ///
    /// A missing file is the expected first-run state and yields an empty
    /// store. Legacy-schema routes are migrated in place. Malformed JSON and
    /// unreadable files are fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        if !path.exists() {
            info!("History file {} not found, starting empty", path.display());
            return Ok(HistoryStore::default());
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read history file {}: {}", path.display(), e))?;
        let stored: HashMap<String, StoredRoute> = serde_json::from_str(&raw)
            .map_err(|e| format!("Malformed history file {}: {}", path.display(), e))?;

        let mut routes = HashMap::with_capacity(stored.len());
        for (label, route) in stored {
            match route {
                StoredRoute::Current(history) => {
                    routes.insert(label, history);
                }
                StoredRoute::Legacy(entries) => {
                    info!("Migrating legacy history for route {}", label);
                    let mut data = Vec::with_capacity(entries.len());
                    for LegacyEntry(_day, clock, duration) in entries {
                        data.push(HistoryEntry::new(legacy_clock_to_unix(&clock)?, duration));
                    }
                    routes.insert(label, RouteHistory { time: 0, data });
                }
            }
        }

        info!("Loaded history for {} routes from {}", routes.len(), path.display());
        Ok(HistoryStore { routes })
    }

    /// Append one sample for `label` and set the route's quick-glance `time`
    /// to `baseline_secs`, the first route option's raw pre-traffic duration.
    pub fn record_sample(&mut self, label: &str, baseline_secs: u64, entry: HistoryEntry) {
        let route = self.routes.entry(label.to_string()).or_default();
        route.data.push(entry);
        route.time = baseline_secs;
    }

    /// Serialize the full mapping and replace the file contents.
    ///
    /// Failures propagate: a silently failed save would desynchronize the
    /// in-memory store and durable state across restarts.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create history directory: {}", e))?;
        }

        let json = serde_json::to_string(self)
            .map_err(|e| format!("Failed to serialize history: {}", e))?;
        fs::write(path, json)
            .map_err(|e| format!("Failed to write history file {}: {}", path.display(), e))
    }

    pub fn get(&self, label: &str) -> Option<&RouteHistory> {
        self.routes.get(label)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Interpret a legacy `"HH:mm"` clock value as that time of day on the
/// current local date, as unix seconds.
pub fn legacy_clock_to_unix(clock: &str) -> Result<u64, String> {
    let time = NaiveTime::parse_from_str(clock, "%H:%M")
        .map_err(|e| format!("Invalid legacy clock value {:?}: {}", clock, e))?;
    let today = Local::now().date_naive();
    let stamp = today
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| format!("Legacy clock value {:?} has no local representation", clock))?;
    Ok(stamp.timestamp().max(0) as u64)
}
