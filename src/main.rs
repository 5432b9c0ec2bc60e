// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use relational_messenger::api::router;
use relational_messenger::blockchain::{Sponsor, SponsorClient, ThorClient, ThorNode};
use relational_messenger::config::{LogFormat, MessengerConfig, DEFAULT_LOG_FILTER};
use relational_messenger::messenger::Messenger;
use relational_messenger::state::AppState;
use relational_messenger::store::InMemoryStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).init(),
    }
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn watch_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() {
    let config = MessengerConfig::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    let node = ThorClient::new(&config.node_url).expect("Invalid NETWORK_URL");
    let sponsor = SponsorClient::new(&config.delegate_url).expect("Invalid DELEGATE_URL");
    let messenger = Messenger::new(
        Box::new(node) as Box<dyn ThorNode>,
        Box::new(sponsor) as Box<dyn Sponsor>,
        config.contract_address,
    );

    let store = InMemoryStore::from_delimited(&config.private_keys)
        .expect("PRIVATE_KEYS contains an invalid key");
    tracing::info!(accounts = store.len(), "Keyring loaded");

    let state = AppState::new(messenger, store, &config.explorer_url);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        %addr,
        node = %config.node_url,
        contract = %config.contract_address,
        "Relational Messenger listening (docs at /docs)"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_shutdown(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .expect("HTTP server failed");

    tracing::info!("Server stopped");
}
