use std::fmt;

/// Result of one refresh attempt, or of a token lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
    Success,
    /// Credentials rejected, or the endpoint answered in an unexpected shape.
    AuthorizationFail,
    /// The endpoint could not be reached or the call did not complete.
    NetworkFail,
    /// The response body did not hold a usable token payload.
    BadData,
}

impl RefreshOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, RefreshOutcome::Success)
    }
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshOutcome::Success => write!(f, "success"),
            RefreshOutcome::AuthorizationFail => write!(f, "authorization_fail"),
            RefreshOutcome::NetworkFail => write!(f, "network_fail"),
            RefreshOutcome::BadData => write!(f, "bad_data"),
        }
    }
}
