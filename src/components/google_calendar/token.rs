use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

/// Refresh this long before the provider-declared expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Access token held in memory
///
/// Without a provider-declared lifetime the token is trusted until the API
/// answers 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: Option<i64>, now: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: expires_in.and_then(|secs| expiry_from(now, secs)),
        }
    }

    /// Whether the declared lifetime (minus margin) has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// `now + expires_in - margin`, or `None` when that is not a representable time
fn expiry_from(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    let expires_at = TimeDelta::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .and_then(|at| at.checked_sub_signed(TimeDelta::seconds(EXPIRY_MARGIN_SECS)));

    if expires_at.is_none() {
        warn!(
            "Ignoring out-of-range expires_in ({}), token kept until rejected",
            expires_in
        );
    }
    expires_at
}
