use std::fmt;

use jiff::Timestamp;

use super::RefreshPolicy;

/// Where a snapshot sits in its lifetime at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenPhase {
    /// Before the preferred refresh time.
    Fresh,
    /// Still servable, but a background refresh should be attempted.
    PreferredStale,
    /// Must be refreshed before it can be handed out.
    Expired,
}

/// One issued credential. Never mutated once built; the cache replaces it whole.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    access_token: Option<String>,
    issued_at: Timestamp,
    expire_at: Timestamp,
    preferred_refresh_at: Timestamp,
}

impl TokenSnapshot {
    /// The state before the first successful refresh: no token, already expired.
    pub fn empty() -> Self {
        Self {
            access_token: None,
            issued_at: Timestamp::MIN,
            expire_at: Timestamp::MIN,
            preferred_refresh_at: Timestamp::MIN,
        }
    }

    /// Builds a snapshot for a token issued at `issued_at` living `expires_in` seconds.
    ///
    /// Returns `None` when the expiry cannot be represented. Any lifetime that
    /// overflows the preferred refresh time already fails here, so that fallback
    /// only shows through [`RefreshPolicy::preferred_refresh_at`] directly.
    pub fn issue(
        access_token: String,
        issued_at: Timestamp,
        expires_in: u64,
        policy: &RefreshPolicy,
    ) -> Option<Self> {
        let expire_at = policy.expire_at(issued_at, expires_in)?;
        Some(Self {
            access_token: Some(access_token),
            issued_at,
            expire_at,
            preferred_refresh_at: policy.preferred_refresh_at(issued_at, expires_in),
        })
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }

    pub fn expire_at(&self) -> Timestamp {
        self.expire_at
    }

    pub fn preferred_refresh_at(&self) -> Timestamp {
        self.preferred_refresh_at
    }

    /// A token is usable strictly before its expiry.
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.access_token.is_some() && now < self.expire_at
    }

    /// True while no background refresh is wanted yet.
    pub fn is_preferred(&self, now: Timestamp) -> bool {
        now < self.preferred_refresh_at
    }

    pub fn phase(&self, now: Timestamp) -> TokenPhase {
        if !self.is_valid(now) {
            TokenPhase::Expired
        } else if self.is_preferred(now) {
            TokenPhase::Fresh
        } else {
            TokenPhase::PreferredStale
        }
    }
}

impl Default for TokenSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TokenSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSnapshot")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("issued_at", &self.issued_at)
            .field("expire_at", &self.expire_at)
            .field("preferred_refresh_at", &self.preferred_refresh_at)
            .finish()
    }
}
