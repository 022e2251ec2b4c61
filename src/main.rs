use anyhow::Result;

use relay_oauth::auth::{ServiceEndpoint, TokenManager};
use relay_oauth::config::{Command, Config};
use relay_oauth::messages::{EnglishMessages, MessageCatalog};
use relay_oauth::OAuthError;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;

    // Initialize logging with a configured level; stdout is reserved for output
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::debug!("OAuth server: {}", config.oauth.server_base);

    match config.command {
        Command::LoginUrl => {
            let endpoint = ServiceEndpoint::resolve(&config.oauth.server_base, &config.service)?;
            println!("{}", endpoint.login_url);
        }
        Command::Token => {
            let manager = TokenManager::new(
                config.oauth.clone(),
                &config.auth_id,
                &config.service,
                config.user_agent.as_deref(),
            )
            .map_err(|e| report(e, &EnglishMessages))?;

            let token = manager
                .access_token()
                .await
                .map_err(|e| report(e, &EnglishMessages))?;

            tracing::info!(
                "✅ Access token acquired (token: {}...)",
                token.chars().take(8).collect::<String>()
            );
            println!("{}", token);
        }
    }

    Ok(())
}

/// Log a fatal error with its user-facing text and hand it back to `main`
fn report(error: OAuthError, catalog: &dyn MessageCatalog) -> anyhow::Error {
    tracing::error!("❌ {}", error.user_message(catalog));
    if let Some(login_url) = error.login_url() {
        tracing::error!("🔧 Get a new AuthID from: {}", login_url);
    }
    anyhow::Error::new(error)
}
