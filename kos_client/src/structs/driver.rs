use serde::{Deserialize, Serialize};

/// Driver profile as returned by `/drivers/me` and the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id:            i64,
    pub name:          String,
    pub email:         String,
    pub phone:         String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    #[serde(default)]
    pub is_available:  bool,
    pub current_lat:   Option<f64>,
    pub current_lon:   Option<f64>,
    pub created_at:    Option<String>,
    pub updated_at:    Option<String>,
    pub last_login_at: Option<String>,
}
