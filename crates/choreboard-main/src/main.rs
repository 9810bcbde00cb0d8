// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChoreBoard Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;
mod server;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use choreboard_client::ChoreboardClient;
use choreboard_core::{ChoreActions, Coordinator};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("ChoreBoard Bridge - Home Assistant integration for ChoreBoard");
                println!("Version: {VERSION}");
                println!();
                println!("Usage: choreboard-bridge [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{VERSION}");
                return Ok(());
            }
            _ => {
                // Continue to normal execution for other args
            }
        }
    }

    // Initialize tracing with env filter support
    // Respects RUST_LOG environment variable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(run())
}

async fn run() -> Result<()> {
    let config = config::load_config_with_fallback()?;

    info!("🚀 Starting ChoreBoard Bridge v{VERSION}");
    info!("📋 Configuration Summary:");
    info!("   Backend: {}", config.backend.url);
    info!("   API user: {}", config.backend.username);
    info!(
        "   Monitored users: {}",
        if config.system.monitored_users.is_empty() {
            "(none)".to_owned()
        } else {
            config.system.monitored_users.join(", ")
        }
    );
    info!("   Scan interval: {}s", config.system.scan_interval_secs);
    info!("   Server port: {}", config.server.port);

    let client = Arc::new(
        ChoreboardClient::new(
            config.backend.url.clone(),
            config.backend.username.clone(),
            config.backend.secret_key.clone(),
        )
        .context("Failed to build ChoreBoard client")?,
    );

    // Startup must survive a temporarily unreachable backend; the
    // coordinator keeps retrying on its own schedule.
    if client.test_connection().await {
        info!("✅ Connected to ChoreBoard at {}", config.backend.url);
    } else {
        warn!(
            "⚠️ Could not reach ChoreBoard at {}, continuing and retrying on schedule",
            config.backend.url
        );
    }

    let (coordinator, snapshot_rx, refresh) = Coordinator::new(
        client.clone(),
        config.system.monitored_users.clone(),
        config.scan_interval(),
    );
    let actions = ChoreActions::new(client, refresh);

    let state = server::AppState {
        snapshot_rx,
        actions,
    };
    let port = config.server.port;
    tokio::spawn(async move {
        if let Err(e) = server::start_server(state, port).await {
            tracing::error!("❌ Bridge API server failed: {e}");
        }
    });

    info!("✅ Starting update loop...");
    coordinator.run().await;

    Ok(())
}
