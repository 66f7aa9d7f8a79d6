use std::sync::Arc;

use axum::http::Method;
use axum::{Router, routing::get};
use clap::Parser;
use tokio::{signal, sync::RwLock, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing;

use waypost::badge::{self, BadgeBoard};
use waypost::config::{Cli, Config, default_config_path};
use waypost::handler::{AppState, get_nav, healthcheck, serve_page};
use waypost::highlight::HighlightStyle;
use waypost::model::NavManifest;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config_path = match args.config_path {
        Some(path) => std::path::PathBuf::from(path),
        None => default_config_path(),
    };

    tracing_subscriber::fmt().json().init();
    tracing::info!("waypost.svc starting");

    let cfg = Config::new(config_path.to_str().unwrap()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });

    let manifest = match &cfg.app.manifest {
        Some(path) => NavManifest::from_file(path),
        None => NavManifest::builtin(),
    }
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load navigation manifest");
        std::process::exit(1);
    });
    let table = manifest.route_table().unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build route table");
        std::process::exit(1);
    });
    tracing::info!("loaded manifest with {} routes", table.len());

    let style: HighlightStyle = cfg.style;
    let state = AppState {
        nav: Arc::new(manifest),
        table: Arc::new(table),
        style: Arc::new(style),
        badges: Arc::new(RwLock::new(BadgeBoard::new())),
        badge_ttl: chrono::Duration::seconds(cfg.app.badge_ttl_seconds as i64),
    };

    let address = format!("0.0.0.0:{}", cfg.app.get_port().to_string());
    let cancellation_token = CancellationToken::new();
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel::<()>(1);

    // Background task to drop expired badge entries
    let sweep_badges = state.badges.clone();
    let sweep_ttl = state.badge_ttl;
    let sweep_every = cfg.app.sweep_interval_seconds;
    let sweep_token = cancellation_token.clone();
    let sweep_done = shutdown_complete_tx.clone();
    tokio::spawn(async move {
        let _done = sweep_done;
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(sweep_every));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = sweep_badges.write().await.sweep(sweep_ttl);
                    if removed > 0 {
                        tracing::info!("swept {} expired badge entries", removed);
                    }
                }
                _ = sweep_token.cancelled() => {
                    tracing::info!("badge sweep task shutting down");
                    break;
                }
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/api/nav", get(get_nav))
        .nest("/api", badge::routes())
        .fallback(serve_page)
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("waypost.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server exited with error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
            cancellation_token.cancel();
        }
    }

    drop(shutdown_complete_tx);
    shutdown_complete_rx.recv().await;
    tracing::info!("waypost.svc going off, graceful shutdown complete");
}
