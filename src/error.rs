// Error handling module
// Defines the token lifecycle error taxonomy

use thiserror::Error;

use crate::messages::MessageCatalog;

/// Errors raised by the token manager and its HTTP collaborator
#[derive(Error, Debug)]
pub enum OAuthError {
    /// No authorization identifier was supplied at construction
    #[error("You need an AuthID, you can get it from: {login_url}")]
    MissingCredential { login_url: String },

    /// The exchange service answered with a success status but an unusable body
    #[error("Malformed token response: {message}")]
    MalformedResponse { message: String },

    /// The exchange service is overloaded or throttled
    #[error("Token exchange quota exceeded: {message}")]
    QuotaExceeded { message: String, login_url: String },

    /// The exchange failed for a durable reason, or retries ran out
    #[error("Failed to authorize using the OAuth service: {message}. If the problem persists, try generating a new authid token from: {login_url}")]
    AuthorizationFailure { message: String, login_url: String },

    /// A URL could not be parsed
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Non-success status from an authenticated API call; `body` is the
    /// response text as received
    #[error("HTTP error: {status} - {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// Plumbing failure (client construction, request building)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OAuthError {
    /// Render a fatal error through a message catalogue.
    ///
    /// Only the user-facing kinds are routed through the catalogue; the rest
    /// fall back to their technical description.
    pub fn user_message(&self, catalog: &dyn MessageCatalog) -> String {
        match self {
            OAuthError::MissingCredential { login_url } => catalog.missing_credential(login_url),
            OAuthError::QuotaExceeded { message, login_url } => {
                catalog.quota_exceeded(message, login_url)
            }
            OAuthError::AuthorizationFailure { message, login_url } => {
                catalog.authorization_failure(message, login_url)
            }
            other => other.to_string(),
        }
    }

    /// Login URL the user should visit to fix this error, if any
    pub fn login_url(&self) -> Option<&str> {
        match self {
            OAuthError::MissingCredential { login_url }
            | OAuthError::QuotaExceeded { login_url, .. }
            | OAuthError::AuthorizationFailure { login_url, .. } => Some(login_url),
            _ => None,
        }
    }
}

/// Result type alias for token manager operations
pub type Result<T> = std::result::Result<T, OAuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::EnglishMessages;

    const LOGIN: &str = "https://oauth.example.com/?type=hubic";

    #[test]
    fn test_error_messages() {
        let err = OAuthError::MissingCredential {
            login_url: LOGIN.to_string(),
        };
        assert_eq!(
            err.to_string(),
            format!("You need an AuthID, you can get it from: {}", LOGIN)
        );

        let err = OAuthError::MalformedResponse {
            message: "missing field `access_token`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed token response: missing field `access_token`"
        );

        let err = OAuthError::Http {
            status: 404,
            message: "Not Found".to_string(),
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP error: 404 - Not Found");
    }

    #[test]
    fn test_login_url_present_on_fatal_kinds() {
        let err = OAuthError::AuthorizationFailure {
            message: "revoked".to_string(),
            login_url: LOGIN.to_string(),
        };
        assert_eq!(err.login_url(), Some(LOGIN));

        let err = OAuthError::QuotaExceeded {
            message: "Service Unavailable".to_string(),
            login_url: LOGIN.to_string(),
        };
        assert_eq!(err.login_url(), Some(LOGIN));

        let err = OAuthError::MalformedResponse {
            message: "bad".to_string(),
        };
        assert_eq!(err.login_url(), None);
    }

    #[test]
    fn test_user_message_uses_catalog() {
        let err = OAuthError::AuthorizationFailure {
            message: "Token revoked".to_string(),
            login_url: LOGIN.to_string(),
        };
        let text = err.user_message(&EnglishMessages);
        assert!(text.contains("Token revoked"));
        assert!(text.contains(LOGIN));

        let err = OAuthError::MissingCredential {
            login_url: LOGIN.to_string(),
        };
        assert!(err.user_message(&EnglishMessages).contains(LOGIN));
    }

    #[test]
    fn test_internal_error_message() {
        let err = OAuthError::Internal(anyhow::anyhow!("Something went wrong"));
        assert_eq!(err.to_string(), "Internal error: Something went wrong");
    }

    #[test]
    fn test_invalid_url_message() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = OAuthError::InvalidUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid URL 'not a url'"));
    }
}
