use serde::{Deserialize, Serialize};

use kos_http::TokenGrant;

use crate::structs::driver::Driver;

#[derive(Debug, Clone, Serialize)]
pub struct LoginPayload {
    pub email:    String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupPayload {
    pub name:          String,
    pub email:         String,
    pub password:      String,
    pub phone:         String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
}

/// Login/signup answer: a token grant plus the driver it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub grant:      TokenGrant,
    #[serde(default)]
    pub token_type: Option<String>,
    pub driver:     Driver,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideEstimatePayload {
    pub pickup_address:  String,
    pub dropoff_address: String,
    pub scheduled_time:  String,
    pub passenger_count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRidePayload {
    #[serde(flatten)]
    pub trip:        RideEstimatePayload,
    pub rider_name:  String,
    pub rider_email: String,
    pub rider_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes:       Option<String>,
}

/// Filters for `/admin/overview`. `"all"` and non-positive driver ids mean
/// "no filter" and are left out of the query.
#[derive(Debug, Clone, Default)]
pub struct AdminOverviewFilters {
    pub ride_status:    Option<String>,
    pub payment_status: Option<String>,
    pub driver_id:      Option<i64>,
}

impl AdminOverviewFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.ride_status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
            pairs.push(("ride_status", status.to_owned()));
        }
        if let Some(status) = self.payment_status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
            pairs.push(("payment_status", status.to_owned()));
        }
        if let Some(id) = self.driver_id.filter(|id| *id > 0) {
            pairs.push(("driver_id", id.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_filters_skip_all_and_empty() {
        let filters = AdminOverviewFilters {
            ride_status:    Some("all".into()),
            payment_status: Some("succeeded".into()),
            driver_id:      Some(0),
        };
        assert_eq!(filters.query_pairs(), vec![("payment_status", "succeeded".to_owned())]);

        let filters = AdminOverviewFilters {
            ride_status:    Some("pending".into()),
            payment_status: None,
            driver_id:      Some(7),
        };
        assert_eq!(
            filters.query_pairs(),
            vec![("ride_status", "pending".to_owned()), ("driver_id", "7".to_owned())]
        );
    }

    #[test]
    fn create_ride_payload_is_flat_camel_case() {
        let payload = CreateRidePayload {
            trip: RideEstimatePayload {
                pickup_address:  "Harbour 1".into(),
                dropoff_address: "Airport".into(),
                scheduled_time:  "2026-10-16T10:00".into(),
                passenger_count: 2,
            },
            rider_name:  "Ana".into(),
            rider_email: "ana@example.com".into(),
            rider_phone: "+385 91 000 000".into(),
            notes:       None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "pickupAddress":  "Harbour 1",
                "dropoffAddress": "Airport",
                "scheduledTime":  "2026-10-16T10:00",
                "passengerCount": 2,
                "riderName":      "Ana",
                "riderEmail":     "ana@example.com",
                "riderPhone":     "+385 91 000 000",
            })
        );
    }
}
