use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use veil::{Config, Gate, Notifier, RedirectPage, Server};

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,veil=debug")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("veil: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), veil::Error> {
    let config = Config::from_env()?;

    if config.uses_default_secret() {
        warn!("REDIRECT_SECRET is not set; tokens are signed with a public default key");
    }

    let page = RedirectPage::resolve(config.template_path.as_deref())?;
    let notifier = Notifier::spawn(config.telegram.clone());

    info!(
        target_url = %config.redirect_url,
        allowed_refs = config.allowed_refs.len(),
        notifications = notifier.is_enabled(),
        "starting redirect gate"
    );

    let gate = Arc::new(Gate::new(&config, page, notifier));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    Server::bind(addr).await?.serve(gate.router()).await
}
