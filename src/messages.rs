// User-facing message text for fatal token errors

/// Supplies human-readable text for each fatal error kind.
///
/// Implementations receive only the login URL and the diagnostic reported by
/// the exchange service, never transport internals.
pub trait MessageCatalog: Send + Sync {
    fn missing_credential(&self, login_url: &str) -> String;

    fn authorization_failure(&self, message: &str, login_url: &str) -> String;

    fn quota_exceeded(&self, message: &str, login_url: &str) -> String;
}

/// Built-in English catalogue
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl MessageCatalog for EnglishMessages {
    fn missing_credential(&self, login_url: &str) -> String {
        format!("You need an AuthID, you can get it from: {}", login_url)
    }

    fn authorization_failure(&self, message: &str, login_url: &str) -> String {
        format!(
            "Failed to authorize using the OAuth service: {}. If the problem persists, try generating a new authid token from: {}",
            message, login_url
        )
    }

    fn quota_exceeded(&self, message: &str, login_url: &str) -> String {
        format!(
            "The OAuth service is currently over quota, try again in a few hours ({}). If the problem persists, check the status at: {}",
            message, login_url
        )
    }
}
