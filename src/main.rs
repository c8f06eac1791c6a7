// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use relational_vault_server::{
    api::router,
    config::{AppConfig, LogFormat},
    state::AppState,
};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(LogFormat::default());
            tracing::error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(host = %config.host, port = config.port, error = %err, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let tls = config.tls.clone();
    let state = AppState::new(config);
    if let Some(root) = state.vault.storage().local_root() {
        if let Err(err) = tokio::fs::create_dir_all(root).await {
            tracing::error!(directory = %root.display(), error = %err, "Failed to create storage directory");
            return ExitCode::FAILURE;
        }
    }
    tracing::info!(
        backend = state.vault.storage().name(),
        api = %state.config.api_prefix(),
        "Storage ready"
    );

    let app = router(state);

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
            shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    let served = match tls {
        Some(paths) => {
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                tracing::warn!("A rustls crypto provider was already installed");
            }
            let tls_config = match RustlsConfig::from_pem_file(&paths.cert, &paths.key).await {
                Ok(tls_config) => tls_config,
                Err(err) => {
                    tracing::error!(cert = %paths.cert.display(), error = %err, "Failed to load TLS credentials");
                    return ExitCode::FAILURE;
                }
            };
            tracing::info!("Listening on https://{addr} (docs at /api-docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            tracing::info!("Listening on http://{addr} (docs at /api-docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}
