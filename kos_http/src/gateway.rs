use std::{
    collections::VecDeque,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::Duration as ChronoDuration;
use futures_util::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::{sync::oneshot, time::timeout};

use crate::{
    clock::{Clock, SystemClock},
    error::KosError,
    hook::UnauthorizedHook,
    request::{ApiRequest, ApiResponse},
    store::TokenStore,
    token::{TokenGrant, TokenSet},
    transport::{ReqwestTransport, Transport},
};

pub const REFRESH_PATH: &str = "/auth/driver/refresh";

/// Tunables for the refresh cycle.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub refresh_path:    String,
    /// Upper bound for the refresh call; running out counts as a failed refresh.
    pub refresh_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            refresh_path:    REFRESH_PATH.to_owned(),
            refresh_timeout: Duration::from_secs(10),
        }
    }
}

type Reply = Result<ApiResponse, KosError>;

/// A request parked until the in-flight refresh settles.
struct Waiter {
    request:   ApiRequest,
    rejection: ApiResponse,
    reply:     oneshot::Sender<Reply>,
}

#[derive(Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing(VecDeque<Waiter>),
}

struct Inner {
    transport: Arc<dyn Transport>,
    store:     Arc<dyn TokenStore>,
    clock:     Arc<dyn Clock>,
    hook:      UnauthorizedHook,
    options:   GatewayOptions,
    refresh:   Mutex<RefreshState>,
}

/// Authenticated request gateway.
///
/// Attaches the stored bearer token to every request and, when the backend
/// answers 401, runs a single refresh for all callers that hit the expired
/// token, then replays each of them once with the new token. Cloning is cheap
/// and every clone shares the same refresh state.
#[derive(Clone)]
pub struct AuthGateway {
    inner: Arc<Inner>,
}

impl AuthGateway {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        Self::with_options(transport, store, Arc::new(SystemClock), GatewayOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn Transport>,
        store:     Arc<dyn TokenStore>,
        clock:     Arc<dyn Clock>,
        options:   GatewayOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                clock,
                hook: UnauthorizedHook::new(),
                options,
                refresh: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    /// Gateway over a reqwest transport rooted at `base_url`.
    pub fn connect(
        base_url:     impl AsRef<str>,
        store:        Arc<dyn TokenStore>,
        http_timeout: Duration,
    ) -> Result<Self, KosError> {
        let transport = ReqwestTransport::new(base_url, http_timeout)?;
        Ok(Self::new(Arc::new(transport), store))
    }

    // ── session ─────────────────────────────────────────────────────────

    pub fn register_unauthorized_handler<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.hook.register(handler);
    }

    pub fn unauthorized_hook(&self) -> &UnauthorizedHook {
        &self.inner.hook
    }

    /// Stamps and stores a grant received from login/signup.
    pub fn persist_grant(&self, grant: TokenGrant) -> TokenSet {
        let tokens = TokenSet::from_grant(grant, self.inner.clock.now());
        self.inner.store.store(&tokens);
        info!("session stored, access token valid for {}s", tokens.expires_in);
        tokens
    }

    /// Explicit logout. Does not fire the unauthorized hook.
    pub fn clear_session(&self) {
        self.inner.store.clear();
        info!("session cleared");
    }

    pub fn current_tokens(&self) -> Option<TokenSet> {
        self.inner.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_tokens().is_some_and(|t| t.access().is_some())
    }

    /// Advisory check with a 5 s safety margin.
    pub fn has_valid_access_token(&self) -> bool {
        self.current_tokens()
            .is_some_and(|t| t.is_fresh_at(self.inner.clock.now(), ChronoDuration::seconds(5)))
    }

    // ── request path ────────────────────────────────────────────────────

    /// Request interceptor: sets `Authorization: Bearer <access>` from the
    /// token stored right now, or leaves the request as is.
    pub fn authorize(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(tokens) = self.inner.store.load() {
            if let Some(access) = tokens.access() {
                request.set_bearer(access);
            }
        }
        request
    }

    /// Sends `request`, transparently recovering from an expired access token.
    ///
    /// Non-401 answers are returned as they are, whatever the status. A 401
    /// either parks the request behind a (shared) refresh and replays it once,
    /// or, when there is nothing to refresh with, ends the session and fails
    /// with [`KosError::Unauthorized`].
    pub async fn issue(&self, request: ApiRequest) -> Result<ApiResponse, KosError> {
        let response = self.inner.transport.send(self.authorize(request.clone())).await?;
        if !response.is_auth_failure() {
            return Ok(response);
        }
        if request.is_retried() {
            debug!("{} {} rejected again after refresh [{}]", request.method, request.path, request.id);
            return Err(KosError::unauthorized(request.path, response));
        }

        let mut request = request;
        request.mark_retried();
        let pending = self.park(request, response)?;
        pending.await.unwrap_or(Err(KosError::RefreshAborted))
    }

    /// Convenience: `issue` + status check + JSON decode.
    pub async fn issue_json<T>(&self, request: ApiRequest) -> Result<T, KosError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.issue(request).await?.error_for_status()?.json()
    }

    pub async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, KosError> {
        self.issue_json(ApiRequest::post(path).json(body)?).await
    }

    // ── refresh coordination ────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.inner.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the failed request behind the running refresh, starting one if
    /// the gateway is idle. The whole decision happens under the state lock.
    fn park(
        &self,
        request:   ApiRequest,
        rejection: ApiResponse,
    ) -> Result<oneshot::Receiver<Reply>, KosError> {
        let (reply, pending) = oneshot::channel();
        let mut state = self.lock_state();

        if let RefreshState::Refreshing(waiters) = &mut *state {
            debug!(
                "refresh in flight, queueing {} {} [{}] at #{}",
                request.method, request.path, request.id, waiters.len()
            );
            waiters.push_back(Waiter { request, rejection, reply });
            return Ok(pending);
        }

        let refresh_token = self
            .inner
            .store
            .load()
            .and_then(|t| t.refresh().map(str::to_owned));

        let Some(refresh_token) = refresh_token else {
            self.inner.store.clear();
            drop(state);
            warn!("401 on {} with no refresh token, session invalidated", request.path);
            self.inner.hook.notify();
            return Err(KosError::unauthorized(request.path, rejection));
        };

        debug!("401 on {} [{}], starting token refresh", request.path, request.id);
        *state = RefreshState::Refreshing(VecDeque::from([Waiter { request, rejection, reply }]));
        drop(state);

        // Detached, so a caller giving up cannot strand the queue.
        let gateway = self.clone();
        tokio::spawn(async move { gateway.settle_refresh(refresh_token).await });

        Ok(pending)
    }

    async fn settle_refresh(self, refresh_token: String) {
        let limit = self.inner.options.refresh_timeout;
        let tokens = match timeout(limit, self.request_refresh(&refresh_token)).await {
            Ok(Ok(tokens)) => Some(tokens),
            Ok(Err(err)) => {
                warn!("token refresh failed: {err}");
                None
            }
            Err(_) => {
                warn!("token refresh timed out after {limit:?}");
                None
            }
        };

        match &tokens {
            Some(tokens) => self.inner.store.store(tokens),
            None => self.inner.store.clear(),
        }

        let waiters = {
            let mut state = self.lock_state();
            match mem::take(&mut *state) {
                RefreshState::Refreshing(waiters) => waiters,
                RefreshState::Idle => VecDeque::new(),
            }
        };

        match tokens {
            Some(tokens) => {
                info!("token refreshed, replaying {} request(s)", waiters.len());
                self.replay(waiters, &tokens.access_token).await;
            }
            None => {
                self.inner.hook.notify();
                for Waiter { request, rejection, reply } in waiters {
                    let _ = reply.send(Err(KosError::unauthorized(request.path, rejection)));
                }
            }
        }
    }

    /// The refresh call itself goes straight to the transport: no bearer, no
    /// interception.
    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenSet, KosError> {
        let request = ApiRequest::post(self.inner.options.refresh_path.as_str())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))?;

        let grant: TokenGrant = self
            .inner
            .transport
            .send(request)
            .await?
            .error_for_status()?
            .json()?;

        Ok(TokenSet::from_grant(grant, self.inner.clock.now()))
    }

    /// Resubmits in queue order. Each send is started before the next one,
    /// completions may interleave.
    async fn replay(&self, waiters: VecDeque<Waiter>, access_token: &str) {
        let replays = waiters.into_iter().map(|Waiter { mut request, reply, .. }| {
            request.set_bearer(access_token);
            let transport = self.inner.transport.clone();
            async move {
                let path = request.path.clone();
                let outcome = match transport.send(request).await {
                    Ok(resp) if resp.is_auth_failure() => Err(KosError::unauthorized(path, resp)),
                    other => other,
                };
                let _ = reply.send(outcome);
            }
        });
        join_all(replays).await;
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let refreshing = matches!(*self.lock_state(), RefreshState::Refreshing(_));
        f.debug_struct("AuthGateway")
            .field("options", &self.inner.options)
            .field("refreshing", &refreshing)
            .finish()
    }
}
