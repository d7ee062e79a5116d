use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tracing::{trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::endpoint::{HttpEndpoint, TokenEndpoint};
use crate::errors::Error;
use crate::telemetry::refresh::{RefreshMode, RefreshTelemetry};
use crate::token::{Credentials, RefreshOutcome, RefreshPolicy, TokenCache, TokenSnapshot};

/// Status of a token lookup plus the token when it succeeded.
pub type AccessToken = (RefreshOutcome, Option<String>);

/// Hands out a cached bearer token, refreshing it when it expires and
/// opportunistically in the background once it passes its preferred refresh time.
///
/// Cloning is cheap; clones share the same cache.
pub struct Authorization<E = HttpEndpoint> {
    cache: Arc<TokenCache<E>>,
    runtime: Handle,
    background_pending: Arc<AtomicBool>,
}

impl<E> Clone for Authorization<E> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            runtime: self.runtime.clone(),
            background_pending: Arc::clone(&self.background_pending),
        }
    }
}

impl Authorization<HttpEndpoint> {
    /// Create an Authorization against the default token endpoint.
    ///
    /// Must be called from within a tokio runtime; background refreshes are
    /// spawned onto it.
    pub fn new(username: &str, password: &str) -> Result<Self, Error> {
        Self::from_config(Config::new(username, password))
    }

    pub fn from_config(config: Config) -> Result<Self, Error> {
        let endpoint = HttpEndpoint::new(&config)?;
        let policy = RefreshPolicy::new(config.preferred_refresh_percent)?;
        Self::with_endpoint(
            Credentials::new(config.username, config.password),
            endpoint,
            policy,
        )
    }
}

impl<E: TokenEndpoint + 'static> Authorization<E> {
    pub fn with_endpoint(
        credentials: Credentials,
        endpoint: E,
        policy: RefreshPolicy,
    ) -> Result<Self, Error> {
        Self::with_clock(credentials, endpoint, policy, Arc::new(SystemClock))
    }

    /// Like [`Authorization::with_endpoint`], reading time from `clock`.
    pub fn with_clock(
        credentials: Credentials,
        endpoint: E,
        policy: RefreshPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Runtime(format!("Authorization needs a tokio runtime: {}", e)))?;
        Ok(Self {
            cache: Arc::new(TokenCache::new(credentials, endpoint, policy, clock)),
            runtime,
            background_pending: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns a valid token, refreshing first if the cached one has expired.
    ///
    /// The lookup runs as its own task, so dropping this future never
    /// interrupts a refresh that is already talking to the endpoint.
    pub async fn access_token(&self) -> AccessToken {
        let this = self.clone();
        match self.runtime.spawn(async move { this.lookup().await }).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "token lookup task did not complete");
                (RefreshOutcome::NetworkFail, None)
            }
        }
    }

    /// Blocking variant of [`Authorization::access_token`] for synchronous callers.
    ///
    /// The captured runtime has to be a multi-threaded one, or be driven
    /// by another thread, for the request to make progress.
    ///
    /// # Panics
    /// When called from inside an async context, as with [`Handle::block_on`].
    pub fn blocking_access_token(&self) -> AccessToken {
        self.runtime.block_on(self.lookup())
    }

    /// Refreshes `observed` in the caller's task, see [`TokenCache::refresh`].
    pub async fn refresh(&self, observed: &Arc<TokenSnapshot>) -> RefreshOutcome {
        let telemetry = RefreshTelemetry::new(RefreshMode::Blocking);
        self.cache.refresh(observed, &telemetry).await
    }

    pub fn snapshot(&self) -> Arc<TokenSnapshot> {
        self.cache.snapshot()
    }

    /// True while a background refresh task is queued or running.
    pub fn background_refresh_pending(&self) -> bool {
        self.background_pending.load(Ordering::Acquire)
    }

    async fn lookup(&self) -> AccessToken {
        let mut snapshot = self.cache.snapshot();
        if !snapshot.is_valid(self.cache.now()) {
            let outcome = self.refresh(&snapshot).await;
            if !outcome.is_success() {
                return (outcome, None);
            }
            snapshot = self.cache.snapshot();
        }

        let now = self.cache.now();
        let token = match snapshot.access_token() {
            Some(token) if snapshot.is_valid(now) => token.to_owned(),
            // Only reachable when the clock passed a brand new token's expiry.
            _ => return (RefreshOutcome::BadData, None),
        };
        if !snapshot.is_preferred(now) {
            self.spawn_background_refresh(snapshot);
        }
        (RefreshOutcome::Success, Some(token))
    }

    /// Fire-and-forget refresh of a still valid token. The outcome is dropped.
    fn spawn_background_refresh(&self, observed: Arc<TokenSnapshot>) {
        if self.background_pending.swap(true, Ordering::AcqRel) {
            trace!("background refresh already pending");
            return;
        }
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.background_pending);
        self.runtime.spawn(async move {
            let _pending = PendingReset(pending);
            let telemetry = RefreshTelemetry::new(RefreshMode::Background);
            let _ = cache.refresh(&observed, &telemetry).await;
        });
    }
}

/// Clears the background flag however the task ends, panics and runtime shutdown included.
struct PendingReset(Arc<AtomicBool>);

impl Drop for PendingReset {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
