use std::fmt;

use serde::{Deserialize, Serialize};

use crate::structs::payment::PaymentSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pending    => "pending",
            RideStatus::Accepted   => "accepted",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed  => "completed",
            RideStatus::Cancelled  => "cancelled",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ride record. Address fields vary between backend versions, hence the
/// optional aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id:                         i64,
    pub rider_name:                 Option<String>,
    pub user_email:                 Option<String>,
    pub user_phone:                 Option<String>,
    pub driver_id:                  Option<i64>,
    pub pickup_lat:                 Option<f64>,
    pub pickup_lon:                 Option<f64>,
    pub pickup_address:             String,
    pub dest_lat:                   Option<f64>,
    pub dest_lon:                   Option<f64>,
    pub dest_address:               String,
    pub dropoff_address:            Option<String>,
    pub destination_address:        Option<String>,
    pub status:                     RideStatus,
    pub fare:                       f64,
    pub distance_km:                f64,
    pub estimated_duration_minutes: f64,
    pub passenger_count:            u32,
    pub scheduled_time:             Option<String>,
    pub notes:                      Option<String>,
    pub payment_intent_id:          Option<String>,
    pub payment_status:             Option<String>,
    pub customer_phone:             Option<String>,
    pub created_at:                 Option<String>,
    pub updated_at:                 Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideEstimate {
    pub distance_km:      f64,
    pub duration_minutes: f64,
    pub fare:             f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRide {
    pub ride:            Ride,
    pub estimate:        RideEstimate,
    #[serde(default)]
    pub payment:         Option<PaymentSummary>,
    #[serde(default)]
    pub payment_error:   Option<String>,
    #[serde(default)]
    pub publishable_key: Option<String>,
}

/// `{ "rides": [...] }`; a missing list means no rides.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RideList {
    #[serde(default)]
    pub rides: Vec<Ride>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RideEnvelope {
    pub ride: Ride,
}
