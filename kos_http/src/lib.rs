//! HTTP layer for the Kos Taxi backend: bearer attachment, single-flight
//! token refresh on 401, replay of parked requests, session invalidation hook.

pub mod clock;
pub mod error;
pub mod gateway;
pub mod hook;
pub mod request;
pub mod store;
pub mod token;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use error::KosError;
pub use gateway::{AuthGateway, GatewayOptions, REFRESH_PATH};
pub use hook::{UnauthorizedHandler, UnauthorizedHook};
pub use request::{ApiRequest, ApiResponse};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, DEFAULT_TOKEN_KEY};
pub use token::{TokenGrant, TokenSet};
pub use transport::{ReqwestTransport, Transport};

pub use reqwest::{Method, StatusCode};
