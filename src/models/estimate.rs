//! Ride estimate models

use serde::{Deserialize, Serialize};

/// Body of an estimate request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateRequest {
    pub product_id: String,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub seat_count: u32,
}

/// Upfront fare quote
#[derive(Debug, Clone, Deserialize)]
pub struct Fare {
    /// Human readable price, e.g. "$12.34"
    pub display: String,
    pub value: Option<f64>,
    pub currency_code: Option<String>,
    pub fare_id: Option<String>,
    pub expires_at: Option<u64>,
}

/// Trip distance and duration
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub distance_unit: Option<String>,
    pub duration_estimate: Option<u64>,
    pub distance_estimate: Option<f64>,
}

/// Response of the estimate endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RideEstimate {
    pub fare: Option<Fare>,
    pub trip: Option<Trip>,
    /// Minutes until pickup
    pub pickup_estimate: Option<u64>,
    /// Body as received, for detail output
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl RideEstimate {
    pub fn from_value(raw: serde_json::Value) -> serde_json::Result<Self> {
        let mut estimate: Self = serde_json::from_value(raw.clone())?;
        estimate.raw = raw;
        Ok(estimate)
    }

    pub fn fare_display(&self) -> Option<&str> {
        self.fare.as_ref().map(|f| f.display.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_estimate() {
        let body = json!({
            "fare": {
                "value": 5.73,
                "fare_id": "d30e732b8bba22c9cdc10513ee86380087cb4a6f89e37ad21ba2a39f3a1ba960",
                "expires_at": 1476953293,
                "display": "$5.73",
                "currency_code": "USD",
                "breakdown": [{"type": "base_fare", "value": 5.73, "name": "Base Fare"}]
            },
            "trip": {
                "distance_unit": "mile",
                "duration_estimate": 540,
                "distance_estimate": 2.39
            },
            "pickup_estimate": 2
        });

        let est = RideEstimate::from_value(body.clone()).unwrap();
        assert_eq!(est.fare_display(), Some("$5.73"));
        assert_eq!(est.pickup_estimate, Some(2));
        assert_eq!(est.trip.as_ref().unwrap().duration_estimate, Some(540));
        assert_eq!(est.raw, body);
    }

    #[test]
    fn test_raw_keeps_unmodelled_fields() {
        let body = json!({
            "fare": {"display": "$5.73", "breakdown": []},
            "trip": {
                "distance_unit": "mile",
                "duration_estimate": 540,
                "distance_estimate": 2.39,
                "surge": 1.2
            }
        });

        let est = RideEstimate::from_value(body.clone()).unwrap();
        assert_eq!(est.raw, body);
        assert_eq!(est.raw["trip"]["surge"], 1.2);
        assert!(est.raw.get("pickup_estimate").is_none());
    }

    #[test]
    fn test_missing_fare() {
        let est = RideEstimate::from_value(json!({"pickup_estimate": 4})).unwrap();
        assert_eq!(est.fare_display(), None);
    }

    #[test]
    fn test_request_body_fields() {
        let req = EstimateRequest {
            product_id: "p1".to_string(),
            start_latitude: 1.5,
            start_longitude: 2.5,
            end_latitude: 3.5,
            end_longitude: 4.5,
            seat_count: 1,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["product_id"], "p1");
        assert_eq!(v["start_latitude"], 1.5);
        assert_eq!(v["end_longitude"], 4.5);
        assert_eq!(v["seat_count"], 1);
    }
}
