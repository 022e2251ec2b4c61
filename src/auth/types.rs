// Authentication types

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Bearer token held by the manager.
///
/// Replaced as a whole on every successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Build a cache entry from a refresh answered at `now`, pulling the expiry
    /// forward by `skew`.
    ///
    /// Lifetimes beyond what `DateTime` can represent saturate at its bounds.
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>, skew: Duration) -> Self {
        let saturated = if response.expires < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        };

        let expires_at = Duration::try_seconds(response.expires)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .and_then(|expiry| expiry.checked_sub_signed(skew))
            .unwrap_or(saturated);

        Self {
            access_token: response.access_token,
            expires_at,
        }
    }

    /// True while `now` has not passed the (skewed) expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Token exchange response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub expires: i64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}
