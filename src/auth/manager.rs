use anyhow::Context;
use chrono::{Duration, Utc};
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::classify::diagnostic;
use super::endpoint::ServiceEndpoint;
use super::refresh;
use super::types::{CachedToken, TokenResponse};
use crate::config::OAuthConfig;
use crate::error::{OAuthError, Result};
use crate::http_client::{HttpFailure, JsonWebClient};

/// Header carrying the AuthID on exchange requests
pub const AUTH_ID_HEADER: &str = "X-AuthID";

/// Token manager
/// Exchanges an AuthID for bearer tokens through the OAuth relay and keeps the
/// current token cached until shortly before it expires
pub struct TokenManager {
    /// AuthID, marked sensitive so it never shows up in request debug output
    auth_id: HeaderValue,

    /// Exchange and login URLs
    endpoint: ServiceEndpoint,

    /// HTTP client for exchange and API requests
    http: JsonWebClient,

    /// Exchange timeout and retry settings
    config: OAuthConfig,

    /// Margin subtracted from every reported expiry
    expiry_skew: Duration,

    /// Inject the bearer header into requests built by `create_request`
    auto_auth_header: AtomicBool,

    /// Current token; replaced as a whole
    token: RwLock<Option<CachedToken>>,

    /// Serializes refreshes so concurrent callers share one exchange
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    /// Create a manager for `auth_id`, issued for the module `service_name`
    pub fn new(
        config: OAuthConfig,
        auth_id: &str,
        service_name: &str,
        user_agent: Option<&str>,
    ) -> Result<Self> {
        let endpoint = ServiceEndpoint::resolve(&config.server_base, service_name)?;

        if auth_id.trim().is_empty() {
            return Err(OAuthError::MissingCredential {
                login_url: endpoint.login_url.to_string(),
            });
        }

        let mut auth_id =
            HeaderValue::from_str(auth_id).context("AuthID is not a valid header value")?;
        auth_id.set_sensitive(true);

        let expiry_skew =
            Duration::from_std(config.expiry_skew).context("Expiry skew is out of range")?;

        let http = JsonWebClient::new(user_agent, config.connect_timeout)?;

        tracing::info!(
            service = service_name,
            exchange_url = %endpoint.exchange_url,
            "OAuth token manager initialized"
        );

        Ok(Self {
            auth_id,
            endpoint,
            http,
            config,
            expiry_skew,
            auto_auth_header: AtomicBool::new(false),
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Page where the user can obtain a new AuthID
    pub fn login_url(&self) -> &str {
        self.endpoint.login_url.as_str()
    }

    /// Token exchange endpoint
    pub fn exchange_url(&self) -> &Url {
        &self.endpoint.exchange_url
    }

    pub fn auto_auth_header(&self) -> bool {
        self.auto_auth_header.load(Ordering::Relaxed)
    }

    pub fn set_auto_auth_header(&self, enabled: bool) {
        self.auto_auth_header.store(enabled, Ordering::Relaxed);
    }

    /// Snapshot of the cached token
    pub async fn cached_token(&self) -> Option<CachedToken> {
        self.token.read().await.clone()
    }

    /// Cached token, if it has not expired yet
    async fn valid_cached_token(&self) -> Option<String> {
        let token = self.token.read().await;
        token
            .as_ref()
            .filter(|t| t.is_valid_at(Utc::now()))
            .map(|t| t.access_token.clone())
    }

    /// Get a valid access token, refreshing if necessary
    /// Thread-safe method that ensures only one refresh occurs at a time
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.valid_cached_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = self.valid_cached_token().await {
            tracing::debug!("Using token refreshed by a concurrent caller");
            return Ok(token);
        }

        tracing::debug!("Refreshing access token...");

        let response = refresh::refresh_with_retry(
            &self.config.retry,
            self.login_url(),
            || self.exchange::<TokenResponse>(),
        )
        .await?;

        let cached = CachedToken::from_response(response, Utc::now(), self.expiry_skew);
        let access_token = cached.access_token.clone();

        tracing::info!(
            "Access token refreshed, expires: {}",
            cached.expires_at.to_rfc3339()
        );

        *self.token.write().await = Some(cached);

        Ok(access_token)
    }

    /// One exchange call, decoded into `T`
    async fn exchange<T: DeserializeOwned>(&self) -> std::result::Result<T, HttpFailure> {
        let request = self
            .http
            .create_request(Method::GET, self.endpoint.exchange_url.clone())
            .header(AUTH_ID_HEADER, self.auth_id.clone())
            .timeout(self.config.request_timeout);

        self.http.read_json(request).await
    }

    /// Single raw exchange call without caching or retries
    pub async fn token_response<T: DeserializeOwned>(&self) -> Result<T> {
        self.exchange().await.map_err(into_api_error)
    }

    /// Build a request for `url`.
    ///
    /// With auto-header mode on, every URL except the exchange endpoint gets
    /// an `Authorization: Bearer` header, which may trigger a token refresh.
    pub async fn create_request(&self, url: &str, method: Option<Method>) -> Result<RequestBuilder> {
        let target = Url::parse(url).map_err(|source| OAuthError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let is_exchange = self.endpoint.is_exchange_url(&target);
        let request = self
            .http
            .create_request(method.unwrap_or(Method::GET), target);

        if self.auto_auth_header() && !is_exchange {
            let token = self.access_token().await?;
            return Ok(request.bearer_auth(token));
        }

        Ok(request)
    }

    /// GET `url` and decode its JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = self.create_request(url, None).await?;
        self.http.read_json(request).await.map_err(into_api_error)
    }
}

/// Map a failed API call onto the public error type
fn into_api_error(failure: HttpFailure) -> OAuthError {
    match failure {
        HttpFailure::Decode(e) => OAuthError::MalformedResponse {
            message: e.to_string(),
        },
        HttpFailure::Transport(e) => {
            OAuthError::Internal(anyhow::Error::new(e).context("HTTP request failed"))
        }
        status_failure @ HttpFailure::Status { .. } => OAuthError::Http {
            status: status_failure.status().map_or(0, |s| s.as_u16()),
            message: diagnostic(&status_failure),
            body: status_failure.body().unwrap_or_default().to_string(),
        },
    }
}
