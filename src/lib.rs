// Relay OAuth - library root

pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod messages;

pub use auth::TokenManager;
pub use config::OAuthConfig;
pub use error::{OAuthError, Result};
