// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! StudioBay - session graph monitor for the LADISH daemon.
//!
//! Mirrors the daemon's studio graph, room list, and app supervision state
//! into a local model and renders every change to the log.

mod config;
mod graph;
mod reconciler;
mod rooms;
mod session;
mod snapshot;
mod view;

use config::{AppConfig, ConfigManager};
use reconciler::Reconciler;
use session::SessionClient;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use view::{TraceCanvas, ViewProjector};

fn load_config() -> AppConfig {
    match ConfigManager::new().and_then(|manager| manager.load_config()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config unavailable ({e}), using defaults");
            AppConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();

    // Initialize logging; RUST_LOG takes precedence over the config filter.
    let directive = config
        .log
        .filter
        .parse()
        .unwrap_or_else(|_| "studiobay=debug".parse().unwrap());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(directive))
        .init();

    info!("Starting StudioBay");

    let runtime = tokio::runtime::Runtime::new()?;
    let client = runtime.block_on(SessionClient::connect(config.call_timeout()))?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let stream_client = client.clone();
    runtime.spawn(async move {
        if let Err(e) = stream_client.run_event_stream(tx).await {
            error!("signal stream failed: {}", e);
        }
    });

    let projector = ViewProjector::with_split_offset(TraceCanvas, config.canvas.split_offset);
    let mut reconciler = Reconciler::new(client, projector);

    // No studio may be loaded yet; start empty and wait for signals.
    if let Err(e) = reconciler.resync() {
        warn!("initial resync failed: {}", e);
    }

    // Events apply on this thread, strictly in arrival order.
    while let Some(event) = rx.blocking_recv() {
        reconciler.apply(event);
    }

    info!("Session daemon connection closed, exiting");
    Ok(())
}
