//! Destination prediction resolver.
//!
//! Pure transformation of one destination descriptor plus one raw transport
//! outcome into a normalized [`Prediction`]. No I/O and no access to the
//! historical store; the coordinator decides what to fold.

use crate::provider::{DirectionsResponse, ProviderLeg};
use crate::transport::TransportOutcome;
use crate::types::{DestinationConfig, Prediction, RouteSummary, TransitLegInfo};
use log::debug;

/// Classify one transport outcome into a prediction.
///
/// Classification order: transport failure, unparseable body, provider
/// `error_message`, non-OK provider status, then route construction. Every
/// failure is contained in the returned prediction; nothing escapes.
pub fn resolve(destination: &DestinationConfig, outcome: TransportOutcome) -> Prediction {
    match outcome {
        TransportOutcome::Failure(cause) => Prediction::failure(
            destination,
            format!("Error getting traffic prediction: {}", cause),
        ),
        TransportOutcome::HttpError(status) => Prediction::failure(
            destination,
            format!("Error getting traffic prediction: {}", status),
        ),
        TransportOutcome::Body(body) => resolve_body(destination, &body),
    }
}

fn resolve_body(destination: &DestinationConfig, body: &str) -> Prediction {
    let data: DirectionsResponse = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(e) => {
            return Prediction::failure(
                destination,
                format!("Malformed provider response: {}", e),
            )
        }
    };

    if let Some(message) = data.error_message {
        debug!("Provider error for {}: {}", destination.label, message);
        return Prediction::failure(destination, message);
    }
    if data.status != "OK" {
        return Prediction::failure(
            destination,
            format!("Provider status not OK: {}", data.status),
        );
    }

    let mut prediction = Prediction {
        config: destination.clone(),
        routes: Vec::new(),
        error: false,
        error_msg: None,
    };

    for route in &data.routes {
        let Some(leg) = route.legs.first() else {
            return Prediction::failure(
                destination,
                format!("Provider route {:?} has no legs", route.summary),
            );
        };

        let mut summary = RouteSummary {
            summary: route.summary.clone(),
            time: leg.duration.value,
            time_in_traffic: leg.duration_in_traffic.map(|d| d.value),
            transit_info: None,
        };

        if destination.mode.is_transit() {
            let transit_info = scan_transit_steps(destination, leg);
            if transit_info.is_empty() {
                let travel_modes = leg
                    .steps
                    .iter()
                    .map(|s| s.travel_mode.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                // Flags the prediction but keeps routes already built
                prediction.error = true;
                prediction.error_msg = Some(format!(
                    "Transit directions do not contain any transit legs ({})",
                    travel_modes
                ));
            }
            summary.transit_info = Some(transit_info);
        }

        prediction.routes.push(summary);
    }

    prediction
}

/// Collect one [`TransitLegInfo`] per transit step of the leg. The departure
/// time is attached to the first transit step only, and only when the
/// destination asks for it.
fn scan_transit_steps(destination: &DestinationConfig, leg: &ProviderLeg) -> Vec<TransitLegInfo> {
    let mut transit_info = Vec::new();
    let mut got_first_transit_leg = false;

    for step in &leg.steps {
        let Some(details) = &step.transit_details else {
            continue;
        };

        let mut arrival_time = None;
        if !got_first_transit_leg && destination.show_next_vehicle_departure {
            got_first_transit_leg = true;
            arrival_time = details.departure_time.map(|t| t.value * 1000);
        }

        transit_info.push(TransitLegInfo {
            route_label: details
                .line
                .short_name
                .clone()
                .unwrap_or_else(|| details.line.name.clone()),
            vehicle: details.line.vehicle.kind.clone(),
            arrival_time,
        });
    }

    transit_info
}
