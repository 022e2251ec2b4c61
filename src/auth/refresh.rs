// Token refresh logic

use std::future::Future;
use std::time::Duration;

use super::classify::{classify, Classification, FailureKind};
use super::types::TokenResponse;
use crate::error::{OAuthError, Result};
use crate::http_client::HttpFailure;

/// Bounded exponential backoff for transient exchange failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of exchange attempts
    pub max_attempts: u32,

    /// Delay after the first failed attempt, doubled after each further one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff after the given zero-based attempt: base_delay * 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2_u32
            .checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Run the exchange until it succeeds, fails fatally or the attempts run out.
///
/// `exchange` performs one attempt. The attempt counter lives on this call's
/// stack only. Every transient failure is followed by its backoff delay; once
/// `max_attempts` transient failures have been seen the last diagnostic is
/// raised as an authorization failure.
pub async fn refresh_with_retry<F, Fut>(
    policy: &RetryPolicy,
    login_url: &str,
    mut exchange: F,
) -> Result<TokenResponse>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<TokenResponse, HttpFailure>>,
{
    let mut last_message = String::from("no exchange attempt was made");

    for attempt in 0..policy.max_attempts {
        tracing::debug!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts,
            "Requesting access token from OAuth service"
        );

        let failure = match exchange().await {
            Ok(response) => return Ok(response),
            Err(failure) => failure,
        };

        let classification = classify(&failure);
        if !classification.kind.is_retryable() {
            return Err(fatal_error(classification, &failure, login_url));
        }

        let delay = policy.delay_for(attempt);
        tracing::warn!(
            error_kind = failure.kind(),
            reason = %classification.message,
            body = failure.body().unwrap_or_default(),
            attempt = attempt + 1,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Token exchange failed, backing off"
        );
        last_message = classification.message;
        tokio::time::sleep(delay).await;
    }

    tracing::error!(
        total_attempts = policy.max_attempts,
        reason = %last_message,
        "Token exchange failed after all retries"
    );

    Err(OAuthError::AuthorizationFailure {
        message: last_message,
        login_url: login_url.to_string(),
    })
}

/// Error for a failure that ends the refresh without further attempts
fn fatal_error(
    classification: Classification,
    failure: &HttpFailure,
    login_url: &str,
) -> OAuthError {
    match classification.kind {
        FailureKind::MalformedResponse => {
            tracing::error!(error = %failure, "OAuth service returned an unusable token response");
            OAuthError::MalformedResponse {
                message: failure.to_string(),
            }
        }
        FailureKind::QuotaExceeded => {
            tracing::error!(
                reason = %classification.message,
                "OAuth service quota exceeded"
            );
            OAuthError::QuotaExceeded {
                message: classification.message,
                login_url: login_url.to_string(),
            }
        }
        FailureKind::AuthorizationFailure | FailureKind::Transient => {
            tracing::error!(
                reason = %classification.message,
                "OAuth service refused the AuthID"
            );
            OAuthError::AuthorizationFailure {
                message: classification.message,
                login_url: login_url.to_string(),
            }
        }
    }
}
