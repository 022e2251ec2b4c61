use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::auth::RetryPolicy;

/// Default OAuth relay server
pub const DEFAULT_SERVER_BASE: &str = "https://oauth-dot-lightstone-01.appspot.com";

/// Timeout applied to every token exchange request
pub const EXCHANGE_REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Amount by which a reported expiry is pulled forward
pub const EXPIRY_SKEW: Duration = Duration::from_secs(30);

/// Token manager configuration
#[derive(Clone, Debug, PartialEq)]
pub struct OAuthConfig {
    /// Base address of the OAuth relay server
    pub server_base: String,

    /// Timeout for a single exchange request
    pub request_timeout: Duration,

    /// TCP connect timeout for the HTTP client
    pub connect_timeout: Duration,

    /// Backoff applied to transient exchange failures
    pub retry: RetryPolicy,

    /// Safety margin subtracted from every reported expiry
    pub expiry_skew: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            server_base: DEFAULT_SERVER_BASE.to_string(),
            request_timeout: EXCHANGE_REQUEST_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            expiry_skew: EXPIRY_SKEW,
        }
    }
}

impl OAuthConfig {
    /// Default configuration pointed at another relay server
    pub fn with_server(server_base: impl Into<String>) -> Self {
        Self {
            server_base: server_base.into(),
            ..Self::default()
        }
    }
}

/// Relay OAuth - bearer tokens for storage backends
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// OAuth relay server base address
    #[arg(short = 's', long, env = "OAUTH_SERVER", default_value = DEFAULT_SERVER_BASE)]
    pub server: String,

    /// Module (backend) name the AuthID was issued for
    #[arg(short = 'm', long, env = "OAUTH_SERVICE")]
    pub service: String,

    /// Authorization identifier obtained from the login page
    #[arg(short = 'a', long, env = "OAUTH_AUTH_ID", hide_env_values = true)]
    pub auth_id: Option<String>,

    /// User agent sent with every request
    #[arg(long, env = "OAUTH_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the page where a new AuthID can be obtained
    LoginUrl,
    /// Exchange the AuthID for a bearer token and print it
    Token,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub oauth: OAuthConfig,
    pub service: String,
    pub auth_id: String,
    pub user_agent: Option<String>,
    pub log_level: String,
    pub command: Command,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        Self::from_args(args)
    }

    fn from_args(args: CliArgs) -> Result<Self> {
        let service = args.service.trim().to_string();
        if service.is_empty() {
            anyhow::bail!("OAUTH_SERVICE cannot be empty (use -m or set OAUTH_SERVICE env var)");
        }

        url::Url::parse(&args.server)
            .with_context(|| format!("OAUTH_SERVER is not a valid URL: {}", args.server))?;

        Ok(Config {
            oauth: OAuthConfig::with_server(args.server),
            service,
            // Checked by the token manager so the error carries the login URL
            auth_id: args.auth_id.unwrap_or_default(),
            user_agent: args.user_agent,
            log_level: args.log_level,
            command: args.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = OAuthConfig::default();
        assert_eq!(config.server_base, DEFAULT_SERVER_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(25));
        assert_eq!(config.expiry_skew, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_with_server_keeps_other_defaults() {
        let config = OAuthConfig::with_server("http://127.0.0.1:9000");
        assert_eq!(config.server_base, "http://127.0.0.1:9000");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_from_args() {
        let args = parse(&[
            "relay-oauth",
            "--server",
            "http://localhost:8080",
            "--service",
            "hubic",
            "--auth-id",
            "secret",
            "token",
        ]);
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.oauth.server_base, "http://localhost:8080");
        assert_eq!(config.service, "hubic");
        assert_eq!(config.auth_id, "secret");
        assert_eq!(config.command, Command::Token);
    }

    #[test]
    fn test_missing_auth_id_is_deferred() {
        let args = parse(&["relay-oauth", "-m", "onedrive", "login-url"]);
        let config = Config::from_args(args).unwrap();
        assert_eq!(config.auth_id, "");
        assert_eq!(config.command, Command::LoginUrl);
    }

    #[test]
    fn test_blank_service_is_rejected() {
        let args = parse(&["relay-oauth", "-m", "  ", "token"]);
        assert!(Config::from_args(args).is_err());
    }

    #[test]
    fn test_invalid_server_is_rejected() {
        let args = parse(&["relay-oauth", "-s", "nope", "-m", "hubic", "token"]);
        assert!(Config::from_args(args).is_err());
    }
}
