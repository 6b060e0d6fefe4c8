use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub id:                i64,
    pub ride_id:           i64,
    pub payment_intent_id: String,
    pub status:            String,
    pub amount:            i64,         // центы
    pub amount_eur:        f64,
    pub currency:          String,
    pub customer_email:    Option<String>,
    pub customer_phone:    Option<String>,
    pub last_error:        Option<String>,
    pub created_at:        Option<String>,
    pub updated_at:        Option<String>,
    #[serde(default)]
    pub metadata:          Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub client_secret:     Option<String>,
    /// Set when the backend has no payment provider configured.
    #[serde(default)]
    pub placeholder:       Option<bool>,
    #[serde(default)]
    pub message:           Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeConfig {
    pub publishable_key: Option<String>,
    pub configured:      bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment:        Option<PaymentSummary>,
    pub payment_status: String,
}
