// Exchange and login URL derivation

use url::Url;

use crate::error::{OAuthError, Result};

/// Path of the token exchange call on the relay server
const REFRESH_PATH: &str = "/refresh";

/// URLs resolved once per manager
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEndpoint {
    /// Token exchange endpoint
    pub exchange_url: Url,

    /// Page where the user obtains a new AuthID for this module
    pub login_url: Url,
}

impl ServiceEndpoint {
    /// Derive both URLs from the relay server base and the module name
    pub fn resolve(server_base: &str, module: &str) -> Result<Self> {
        let base = Url::parse(server_base).map_err(|source| OAuthError::InvalidUrl {
            url: server_base.to_string(),
            source,
        })?;

        if base.cannot_be_a_base() {
            return Err(OAuthError::InvalidUrl {
                url: server_base.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let mut exchange_url = base.clone();
        exchange_url.set_path(REFRESH_PATH);
        exchange_url.set_query(None);
        exchange_url.set_fragment(None);

        let mut login_url = base;
        login_url.set_path("/");
        login_url.set_query(None);
        login_url.set_fragment(None);
        login_url.query_pairs_mut().append_pair("type", module);

        tracing::debug!(
            exchange_url = %exchange_url,
            login_url = %login_url,
            "Resolved OAuth service endpoints"
        );

        Ok(Self {
            exchange_url,
            login_url,
        })
    }

    /// Whether `url` points at the exchange endpoint itself
    pub fn is_exchange_url(&self, url: &Url) -> bool {
        *url == self.exchange_url
    }
}
