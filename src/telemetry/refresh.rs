use std::fmt;

use jiff::Timestamp;
use tracing::{Level, event};
use uuid::Uuid;

use crate::token::RefreshOutcome;

/// Why a refresh is being attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshMode {
    /// A caller is waiting on an expired token.
    Blocking,
    /// Opportunistic refresh of a token past its preferred refresh time.
    Background,
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshMode::Blocking => write!(f, "blocking"),
            RefreshMode::Background => write!(f, "background"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    mode: RefreshMode,
}

impl RefreshTelemetry {
    pub fn new(mode: RefreshMode) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            mode,
        }
    }

    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    pub fn emit_start(&self, at: Timestamp) {
        event!(
            Level::DEBUG,
            attempt_id = %self.attempt_id,
            mode = %self.mode,
            timestamp = %at,
            "refresh.start"
        );
    }

    /// Another attempt already settled the snapshot this caller observed.
    pub fn emit_coalesced(&self, outcome: RefreshOutcome) {
        event!(
            Level::DEBUG,
            attempt_id = %self.attempt_id,
            mode = %self.mode,
            outcome = %outcome,
            "refresh.coalesced"
        );
    }

    pub fn emit_success(&self, expire_at: Timestamp, preferred_refresh_at: Timestamp) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            mode = %self.mode,
            expire_at = %expire_at,
            preferred_refresh_at = %preferred_refresh_at,
            "refresh.success"
        );
    }

    /// Background failures stay silent; the next access simply tries again.
    pub fn emit_failure(&self, outcome: RefreshOutcome, detail: &dyn fmt::Display) {
        if self.mode == RefreshMode::Background {
            return;
        }
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            mode = %self.mode,
            outcome = %outcome,
            detail = %detail,
            "refresh.failure"
        );
    }
}
