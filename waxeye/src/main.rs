//! waxeye - photograph a record sleeve, play the record
//!
//! Capture → recognize → search → play, driven by a small web UI for setup
//! (Spotify authorization, player selection) and a single trigger endpoint.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use waxeye::spotify::Endpoints;
use waxeye::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting waxeye v{}", env!("CARGO_PKG_VERSION"));

    // Fatal without client credentials: clap reports and exits non-zero
    let config = Config::parse();

    let state = AppState::build(
        &config,
        Endpoints::default(),
        waxeye::vision::DEFAULT_ANNOTATE_URL.to_string(),
    )?;
    info!("Settings store: {}", config.store_path.display());
    info!(
        "Session: {}, player selected: {}",
        if state.session.is_authenticated() { "present" } else { "absent" },
        state.devices.has_selection()
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("waxeye listening on http://{}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
