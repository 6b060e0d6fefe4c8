use serde::{Deserialize, Serialize};

use crate::structs::{driver::Driver, payment::PaymentSummary, ride::Ride};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilters {
    pub ride_status:    String,
    pub payment_status: String,
    pub driver_id:      i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewTotals {
    pub rides_total:        u64,
    pub rides_pending:      u64,
    pub rides_completed:    u64,
    pub payments_succeeded: u64,
    pub payments_failed:    u64,
    pub drivers_total:      u64,
    pub revenue_eur:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminOverview {
    pub filters:  AppliedFilters,
    pub rides:    Vec<Ride>,
    pub drivers:  Vec<Driver>,
    pub payments: Vec<PaymentSummary>,
    pub totals:   OverviewTotals,
}
