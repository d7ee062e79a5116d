use jiff::{SignedDuration, Timestamp};

use crate::config::DEFAULT_PREFERRED_REFRESH_PERCENT;
use crate::errors::Error;

/// How far into a token's lifetime a background refresh becomes worthwhile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Share of the lifetime, in percent, after which the token is preferred-stale.
    preferred_percent: u8,
}

impl RefreshPolicy {
    pub fn new(preferred_percent: u8) -> Result<Self, Error> {
        if preferred_percent == 0 || preferred_percent > 100 {
            return Err(Error::Config(format!(
                "Preferred refresh percent must be within 1..=100, got {}",
                preferred_percent
            )));
        }
        Ok(Self { preferred_percent })
    }

    pub fn preferred_percent(&self) -> u8 {
        self.preferred_percent
    }

    /// Hard expiry, or `None` if `issued_at + expires_in` is out of range.
    pub fn expire_at(&self, issued_at: Timestamp, expires_in: u64) -> Option<Timestamp> {
        let secs = i64::try_from(expires_in).ok()?;
        issued_at.checked_add(SignedDuration::from_secs(secs)).ok()
    }

    /// Soft refresh point. Any overflow collapses it to `issued_at`, which makes
    /// the token immediately eligible for a background refresh.
    pub fn preferred_refresh_at(&self, issued_at: Timestamp, expires_in: u64) -> Timestamp {
        expires_in
            .checked_mul(u64::from(self.preferred_percent))
            .map(|scaled| scaled / 100)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| issued_at.checked_add(SignedDuration::from_secs(secs)).ok())
            .unwrap_or(issued_at)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            preferred_percent: DEFAULT_PREFERRED_REFRESH_PERCENT,
        }
    }
}
