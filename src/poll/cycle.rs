//! One poll cycle: fan out a request per destination, fan in the responses.
//!
//! Every destination's request starts as soon as the cycle begins; there is
//! no request pool and no per-destination timeout, so a destination that
//! never responds stalls that cycle and its history save indefinitely.
//! Completions arrive in any order and land in a slot vector indexed by the
//! destination's original position, so the emitted batch is always ordered
//! by destination index.

use crate::poll::resolver::resolve;
use crate::storage::{HistoryEntry, HistoryStore};
use crate::transport::Transport;
use crate::types::{now_secs, CycleBatch, DestinationConfig, PollRequest, Prediction};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Transient fan-in record for one cycle.
///
/// Slots are pre-sized to the destination count so out-of-order completions
/// can be coalesced with an explicit counter rather than by watching the
/// vector grow.
pub(crate) struct CycleState {
    destinations: Vec<DestinationConfig>,
    slots: Vec<Option<Prediction>>,
    received: usize,
}

impl CycleState {
    pub(crate) fn new(destinations: Vec<DestinationConfig>) -> Self {
        let count = destinations.len();
        CycleState {
            destinations,
            slots: (0..count).map(|_| None).collect(),
            received: 0,
        }
    }

    pub(crate) fn destination(&self, index: usize) -> &DestinationConfig {
        &self.destinations[index]
    }

    pub(crate) fn complete(&mut self, index: usize, prediction: Prediction) {
        self.slots[index] = Some(prediction);
        self.received += 1;
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.received == self.slots.len()
    }

    /// Ordered predictions; meaningful only once the cycle is complete.
    pub(crate) fn into_predictions(self) -> Vec<Prediction> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Run one full poll cycle for `request`.
///
/// Successful predictions fold into the shared store as their responses
/// arrive; once every destination has resolved, the consolidated batch is
/// emitted and the store snapshot is written back. A persistence failure
/// after the emit is fatal and propagates, but the emitted batch stands.
pub(crate) async fn run_cycle<T: Transport>(
    transport: Arc<T>,
    request: PollRequest,
    store: Arc<RwLock<HistoryStore>>,
    history_path: PathBuf,
    batches: mpsc::Sender<CycleBatch>,
) -> Result<(), String> {
    info!(
        "Polling {} destinations for instance {}",
        request.destinations.len(),
        request.instance_id
    );

    if request.destinations.is_empty() {
        warn!("Poll cycle started with no destinations");
        return Ok(());
    }

    let mut cycle = CycleState::new(request.destinations.clone());
    let (fan_in_tx, mut fan_in) = mpsc::channel(request.destinations.len());

    for (index, destination) in request.destinations.iter().enumerate() {
        debug!("Fetching destination {}", destination.label);
        let transport = Arc::clone(&transport);
        let url = destination.url.clone();
        let fan_in_tx = fan_in_tx.clone();
        tokio::spawn(async move {
            let outcome = transport.fetch(&url).await;
            let _ = fan_in_tx.send((index, outcome)).await;
        });
    }
    drop(fan_in_tx);

    while let Some((index, outcome)) = fan_in.recv().await {
        let destination = cycle.destination(index);
        let prediction = resolve(destination, outcome);
        debug!(
            "Resolved destination {} (error: {})",
            destination.label, prediction.error
        );

        if !prediction.error {
            if let Some(first) = prediction.routes.first() {
                let duration = first.time_in_traffic.unwrap_or(first.time);
                store.write().record_sample(
                    &destination.label,
                    first.time,
                    HistoryEntry::new(now_secs(), duration),
                );
            }
        }

        cycle.complete(index, prediction);
        if cycle.is_complete() {
            break;
        }
    }

    if !cycle.is_complete() {
        return Err("Poll cycle ended before all destinations resolved".to_string());
    }

    let snapshot = store.read().clone();
    let instance_id = request.instance_id.clone();
    let batch = CycleBatch {
        instance_id: request.instance_id,
        predictions: cycle.into_predictions(),
        commute_data: snapshot.clone(),
    };
    // Fire-and-forget: a departed consumer never fails the cycle
    let _ = batches.send(batch).await;
    info!("Poll cycle complete for instance {}", instance_id);

    snapshot.save(&history_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TravelMode;

    fn destination(label: &str) -> DestinationConfig {
        DestinationConfig {
            url: format!("http://provider/{}", label),
            label: label.to_string(),
            mode: TravelMode::Driving,
            show_next_vehicle_departure: false,
        }
    }

    fn prediction(label: &str) -> Prediction {
        Prediction::failure(&destination(label), "x".to_string())
    }

    #[test]
    fn slots_fill_by_index_not_arrival_order() {
        let mut cycle = CycleState::new(vec![destination("A"), destination("B")]);

        cycle.complete(1, prediction("B"));
        assert!(!cycle.is_complete());
        cycle.complete(0, prediction("A"));
        assert!(cycle.is_complete());

        let predictions = cycle.into_predictions();
        assert_eq!(predictions[0].config.label, "A");
        assert_eq!(predictions[1].config.label, "B");
    }

    #[test]
    fn empty_cycle_is_complete_immediately() {
        let cycle = CycleState::new(Vec::new());
        assert!(cycle.is_complete());
    }
}
