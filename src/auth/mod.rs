// Authentication module
// Manages the bearer token lifecycle against the OAuth relay

mod classify;
mod endpoint;
mod manager;
mod refresh;
mod types;

pub use classify::{classify, diagnostic, Classification, FailureKind, REASON_HEADER};
pub use endpoint::ServiceEndpoint;
pub use manager::{TokenManager, AUTH_ID_HEADER};
pub use refresh::{refresh_with_retry, RetryPolicy};
pub use types::{CachedToken, TokenResponse};
