use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::endpoint::TokenEndpoint;
use crate::telemetry::refresh::{RefreshMode, RefreshTelemetry};
use crate::types::TokenResponse;

use super::{Credentials, RefreshOutcome, RefreshPolicy, TokenSnapshot};

/// Holds the current token snapshot and serializes refreshes against the endpoint.
///
/// Readers load the snapshot without locking. Writers only store a new one
/// while holding `refresh_lock`, so at most one endpoint call is in flight.
pub struct TokenCache<E> {
    credentials: Credentials,
    endpoint: E,
    policy: RefreshPolicy,
    clock: Arc<dyn Clock>,
    current: ArcSwap<TokenSnapshot>,
    /// Outcome of the last failed blocking attempt, for callers queued behind it.
    refresh_lock: Mutex<Option<RefreshOutcome>>,
    /// Completed blocking attempts; bumped under `refresh_lock`.
    attempts: AtomicU64,
}

impl<E: TokenEndpoint> TokenCache<E> {
    pub fn new(
        credentials: Credentials,
        endpoint: E,
        policy: RefreshPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            endpoint,
            policy,
            clock,
            current: ArcSwap::from_pointee(TokenSnapshot::empty()),
            refresh_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// The snapshot currently installed.
    pub fn snapshot(&self) -> Arc<TokenSnapshot> {
        self.current.load_full()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Replaces `observed` with a freshly issued token.
    ///
    /// If the installed snapshot is no longer `observed` once the lock is held,
    /// someone else already refreshed it and no request is made. Likewise, if
    /// a blocking attempt for `observed` failed while this caller was queued,
    /// its outcome is reused. Background failures are never handed on.
    /// On any failure the installed snapshot is untouched.
    pub async fn refresh(
        &self,
        observed: &Arc<TokenSnapshot>,
        telemetry: &RefreshTelemetry,
    ) -> RefreshOutcome {
        let seen_attempts = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.refresh_lock.lock().await;

        if !Arc::ptr_eq(observed, &self.current.load()) {
            telemetry.emit_coalesced(RefreshOutcome::Success);
            return RefreshOutcome::Success;
        }
        if self.attempts.load(Ordering::Acquire) != seen_attempts
            && let Some(outcome) = *last_failure
        {
            telemetry.emit_coalesced(outcome);
            return outcome;
        }

        let outcome = self.fetch(telemetry).await;
        if telemetry.mode() == RefreshMode::Blocking {
            *last_failure = (!outcome.is_success()).then_some(outcome);
            self.attempts.fetch_add(1, Ordering::AcqRel);
        }
        outcome
    }

    /// One round trip to the endpoint. Caller must hold `refresh_lock`.
    async fn fetch(&self, telemetry: &RefreshTelemetry) -> RefreshOutcome {
        let issued_at = self.clock.now();
        telemetry.emit_start(issued_at);

        let response = match self
            .endpoint
            .request_token(&self.credentials.to_request())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::NetworkFail, &err);
                return RefreshOutcome::NetworkFail;
            }
        };

        if !response.status.is_success() {
            telemetry.emit_failure(RefreshOutcome::AuthorizationFail, &response.status);
            return RefreshOutcome::AuthorizationFail;
        }
        if !response.is_json() {
            let content_type = response.content_type.as_deref().unwrap_or("<none>");
            telemetry.emit_failure(
                RefreshOutcome::AuthorizationFail,
                &format_args!("unexpected content type {}", content_type),
            );
            return RefreshOutcome::AuthorizationFail;
        }

        let payload: TokenResponse = match serde_json::from_str(&response.body) {
            Ok(payload) => payload,
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::BadData, &err);
                return RefreshOutcome::BadData;
            }
        };
        if payload.expires_in == 0 {
            telemetry.emit_failure(RefreshOutcome::BadData, &"token lifetime is zero");
            return RefreshOutcome::BadData;
        }

        let Some(snapshot) = TokenSnapshot::issue(
            payload.access_token,
            issued_at,
            payload.expires_in,
            &self.policy,
        ) else {
            telemetry.emit_failure(
                RefreshOutcome::BadData,
                &format_args!("token lifetime {}s out of range", payload.expires_in),
            );
            return RefreshOutcome::BadData;
        };

        telemetry.emit_success(snapshot.expire_at(), snapshot.preferred_refresh_at());
        self.current.store(Arc::new(snapshot));
        RefreshOutcome::Success
    }
}
