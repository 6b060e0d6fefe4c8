use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use serde::Deserialize;

pub use kos_http::{
    ApiRequest, ApiResponse, AuthGateway, FileTokenStore, GatewayOptions, KosError,
    MemoryTokenStore, ReqwestTransport, SystemClock, TokenSet, TokenStore,
};

pub mod config;
pub mod types;

pub mod structs {
    pub mod admin;

    pub mod driver;

    pub mod payment;

    pub mod ride;
}

pub use config::ClientConfig;
pub use structs::admin::AdminOverview;
pub use structs::driver::Driver;
pub use structs::payment::{PaymentDetails, PaymentSummary, StripeConfig};
pub use structs::ride::{CreatedRide, Ride, RideEstimate, RideStatus};
pub use types::*;

use structs::ride::{RideEnvelope, RideList};

/// Typed Kos Taxi API. Every call goes through the shared [`AuthGateway`],
/// so an expired access token is refreshed once for all concurrent callers.
#[derive(Clone)]
pub struct KosClient {
    gateway: AuthGateway,
    profile: Arc<RwLock<Option<Driver>>>,
}

impl KosClient {
    /// Wraps `gateway` and takes over its unauthorized hook so the cached
    /// driver profile is dropped whenever the session is invalidated. A
    /// handler already registered on `gateway` keeps running after that.
    pub fn new(gateway: AuthGateway) -> Self {
        let client = Self {
            gateway,
            profile: Arc::new(RwLock::new(None)),
        };
        let previous = client.gateway.unauthorized_hook().handler();
        client.on_session_invalidated(move || {
            if let Some(previous) = &previous {
                previous();
            }
        });
        client
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, KosError> {
        info!("Initializing KosClient against {}", config.api_base_url);
        let store = FileTokenStore::with_key(&config.token_file, &config.token_key);
        let transport = ReqwestTransport::new(&config.api_base_url, config.http_timeout)?;
        let gateway = AuthGateway::with_options(
            Arc::new(transport),
            Arc::new(store),
            Arc::new(SystemClock),
            GatewayOptions {
                refresh_timeout: config.refresh_timeout,
                ..GatewayOptions::default()
            },
        );
        Ok(Self::new(gateway))
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Installs the application's session-invalidated handler, replacing
    /// whatever ran before. The cached profile is dropped before `handler` runs.
    pub fn on_session_invalidated<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let profile = self.profile.clone();
        self.gateway.register_unauthorized_handler(move || {
            info!("session invalidated, dropping cached profile");
            profile.write().unwrap_or_else(PoisonError::into_inner).take();
            handler();
        });
    }

    pub fn cached_profile(&self) -> Option<Driver> {
        self.profile.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn cache_profile(&self, driver: &Driver) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(driver.clone());
    }

    pub fn is_authenticated(&self) -> bool {
        self.gateway.is_authenticated()
    }

    // auth

    pub async fn signup(&self, payload: &SignupPayload) -> Result<Driver, KosError> {
        debug!("start signup");
        let response: AuthResponse = self.gateway.post_json("/auth/driver/signup", payload).await?;
        Ok(self.persist_auth(response))
    }

    pub async fn login(&self, payload: &LoginPayload) -> Result<Driver, KosError> {
        debug!("start login");
        let response: AuthResponse = self.gateway.post_json("/auth/driver/login", payload).await?;
        Ok(self.persist_auth(response))
    }

    fn persist_auth(&self, response: AuthResponse) -> Driver {
        self.gateway.persist_grant(response.grant);
        self.cache_profile(&response.driver);
        response.driver
    }

    /// Tells the backend, but the local session is dropped whatever it says.
    pub async fn logout(&self) {
        debug!("start logout");
        if let Err(err) = self.gateway.issue(ApiRequest::post("/auth/driver/logout")).await {
            debug!("logout call failed, clearing locally anyway: {err}");
        }
        self.gateway.clear_session();
        self.profile.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub async fn me(&self) -> Result<Driver, KosError> {
        #[derive(Deserialize)]
        struct Envelope { driver: Driver }

        let Envelope { driver } = self.gateway.issue_json(ApiRequest::get("/drivers/me")).await?;
        self.cache_profile(&driver);
        Ok(driver)
    }

    // rides

    pub async fn estimate_ride(&self, payload: &RideEstimatePayload) -> Result<RideEstimate, KosError> {
        self.gateway.post_json("/rides/estimate", payload).await
    }

    pub async fn create_ride(&self, payload: &CreateRidePayload) -> Result<CreatedRide, KosError> {
        self.gateway.post_json("/rides", payload).await
    }

    pub async fn pending_rides(&self) -> Result<Vec<Ride>, KosError> {
        let list: RideList = self.gateway.issue_json(ApiRequest::get("/rides/pending")).await?;
        Ok(list.rides)
    }

    /// Rides assigned to the signed-in driver, optionally narrowed by status.
    pub async fn assigned_rides(&self, statuses: &[RideStatus]) -> Result<Vec<Ride>, KosError> {
        let mut request = ApiRequest::get("/drivers/me/assigned-rides");
        if !statuses.is_empty() {
            let joined = statuses.iter().map(RideStatus::as_str).collect::<Vec<_>>().join(",");
            request = request.query("status", joined);
        }
        let list: RideList = self.gateway.issue_json(request).await?;
        Ok(list.rides)
    }

    pub async fn accept_ride(&self, ride_id: i64) -> Result<Ride, KosError> {
        let path = format!("/drivers/me/rides/{ride_id}/accept");
        let envelope: RideEnvelope = self.gateway.issue_json(ApiRequest::post(path)).await?;
        Ok(envelope.ride)
    }

    pub async fn update_ride_status(&self, ride_id: i64, status: RideStatus) -> Result<Ride, KosError> {
        let request = ApiRequest::patch(format!("/drivers/me/rides/{ride_id}/status"))
            .json(&serde_json::json!({ "status": status }))?;
        let envelope: RideEnvelope = self.gateway.issue_json(request).await?;
        Ok(envelope.ride)
    }

    // payments

    pub async fn stripe_config(&self) -> Result<StripeConfig, KosError> {
        self.gateway.issue_json(ApiRequest::get("/payments/config")).await
    }

    pub async fn payment_for_ride(&self, ride_id: i64) -> Result<PaymentDetails, KosError> {
        self.gateway
            .issue_json(ApiRequest::get(format!("/payments/{ride_id}")))
            .await
    }

    // admin

    pub async fn admin_overview(&self, filters: &AdminOverviewFilters) -> Result<AdminOverview, KosError> {
        let request = filters
            .query_pairs()
            .into_iter()
            .fold(ApiRequest::get("/admin/overview"), |req, (k, v)| req.query(k, v));
        self.gateway.issue_json(request).await
    }
}

/// Initialises `env_logger`; `RUST_LOG` wins over `level` when set.
pub fn init_logger(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
}
