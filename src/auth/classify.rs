// Exchange failure classification

use reqwest::StatusCode;

use crate::http_client::HttpFailure;

/// Header the relay uses to explain a refusal
pub const REASON_HEADER: &str = "X-Reason";

/// How the refresh protocol reacts to a failed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network blip, timeout or non-503 status; retried
    Transient,
    /// 503 without a specific reason; fatal
    QuotaExceeded,
    /// 503 with a specific reason; fatal
    AuthorizationFailure,
    /// Success status with an unusable body; fatal
    MalformedResponse,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Transient)
    }
}

/// Classified failure with the diagnostic to show the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: FailureKind,
    pub message: String,
}

/// Generic description of a status code, as the status line would carry it
fn generic_status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Diagnostic message for a failure.
///
/// Prefers the relay's reason header; falls back to the generic status text,
/// then to the transport error.
pub fn diagnostic(failure: &HttpFailure) -> String {
    if let Some(reason) = failure.header(REASON_HEADER) {
        if !reason.trim().is_empty() {
            return reason.to_string();
        }
    }

    match failure.status() {
        Some(status) => generic_status_text(status),
        None => failure.to_string(),
    }
}

/// Decide how to react to a failed exchange.
///
/// A 503 whose diagnostic equals the generic status text carries no specific
/// reason and is read as the shared relay being throttled.
pub fn classify(failure: &HttpFailure) -> Classification {
    let message = diagnostic(failure);

    let kind = match failure {
        HttpFailure::Decode(_) => FailureKind::MalformedResponse,
        _ => match failure.status() {
            Some(status) if status == StatusCode::SERVICE_UNAVAILABLE => {
                if message == generic_status_text(status) {
                    FailureKind::QuotaExceeded
                } else {
                    FailureKind::AuthorizationFailure
                }
            }
            _ => FailureKind::Transient,
        },
    };

    Classification { kind, message }
}
