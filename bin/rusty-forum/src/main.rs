//! # Rusty-Forum Binary
//!
//! Terminal front end: loads configuration, assembles the adapters and
//! hands the view model to the interactive loop.

mod repl;

use rf_api_reqwest::HttpForumApi;
use rf_app::Forum;
use rf_config::{ClientConfig, LogFormat};
use rf_core::TokenStore;
use rf_token_file::{FileTokenStore, MemoryTokenStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::load()?;
    init_tracing(config.log_format);

    let api = HttpForumApi::new(config.api_base())?;

    let tokens: Box<dyn TokenStore> = if config.ephemeral_session {
        Box::new(MemoryTokenStore::new())
    } else {
        Box::new(FileTokenStore::new(config.token_path.clone()))
    };

    info!(
        api_url = %config.api_base(),
        ephemeral = config.ephemeral_session,
        "starting rusty-forum"
    );

    let mut forum = Forum::new(Box::new(api), tokens, config.notification_ttl());
    if let Err(err) = forum.start().await {
        // Already shown in the notification slot.
        debug!(error = %err, "initial load failed");
    }

    repl::run(&mut forum).await
}

/// Logs go to stderr so they never mix into the rendered screen.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
