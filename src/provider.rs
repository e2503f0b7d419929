//! Wire model for the directions provider response body.
//!
//! Only the fields the resolver reads are modeled; everything else in the
//! provider payload is ignored on deserialization.

use serde::Deserialize;

/// Top-level directions response.
#[derive(Clone, Debug, Deserialize)]
pub struct DirectionsResponse {
    /// Provider status; anything other than "OK" is a failed lookup
    #[serde(default)]
    pub status: String,

    /// Set when the provider rejected the request outright (quota, key, ...)
    pub error_message: Option<String>,

    #[serde(default)]
    pub routes: Vec<ProviderRoute>,
}

/// One route alternative.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderRoute {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub legs: Vec<ProviderLeg>,
}

/// One leg of a route. Single-waypoint requests yield exactly one.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderLeg {
    pub duration: DurationValue,

    pub duration_in_traffic: Option<DurationValue>,

    #[serde(default)]
    pub steps: Vec<ProviderStep>,
}

/// Duration in seconds, wrapped the way the provider nests it.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DurationValue {
    pub value: u64,
}

/// One navigation step within a leg.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderStep {
    #[serde(default)]
    pub travel_mode: String,

    /// Present only on transit steps
    pub transit_details: Option<TransitDetails>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransitDetails {
    pub line: TransitLine,

    pub departure_time: Option<EpochValue>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransitLine {
    pub short_name: Option<String>,

    #[serde(default)]
    pub name: String,

    pub vehicle: TransitVehicle,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransitVehicle {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Epoch seconds, wrapped the way the provider nests timestamps.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct EpochValue {
    pub value: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_driving_response() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "summary": "I-95 S",
                "legs": [{
                    "duration": {"text": "10 mins", "value": 600},
                    "duration_in_traffic": {"text": "12 mins", "value": 700},
                    "steps": []
                }]
            }]
        }"#;
        let parsed: DirectionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "OK");
        let leg = &parsed.routes[0].legs[0];
        assert_eq!(leg.duration.value, 600);
        assert_eq!(leg.duration_in_traffic.unwrap().value, 700);
    }

    #[test]
    fn parses_transit_step_details() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "summary": "",
                "legs": [{
                    "duration": {"value": 1800},
                    "steps": [{
                        "travel_mode": "TRANSIT",
                        "transit_details": {
                            "line": {"short_name": "52", "name": "Route 52", "vehicle": {"type": "BUS"}},
                            "departure_time": {"value": 1700000000}
                        }
                    }]
                }]
            }]
        }"#;
        let parsed: DirectionsResponse = serde_json::from_str(body).unwrap();
        let details = parsed.routes[0].legs[0].steps[0]
            .transit_details
            .as_ref()
            .unwrap();
        assert_eq!(details.line.short_name.as_deref(), Some("52"));
        assert_eq!(details.line.vehicle.kind, "BUS");
        assert_eq!(details.departure_time.unwrap().value, 1_700_000_000);
    }
}
