use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use sa_gateway::bootstrap::bootstrap;
use sa_gateway::cli::{load_config, show, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let (config, _path) = load_config(&cli)?;
            run_server(config).await
        }
        Some(Command::ConfigShow) => {
            let (config, path) = load_config(&cli)?;
            show(&config, &path);
            Ok(())
        }
        Some(Command::Version) => {
            println!("sa-gateway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sa_gateway=debug")))
        .json()
        .init();
}

async fn run_server(config: sa_domain::config::Config) -> anyhow::Result<()> {
    tracing::info!("gateway starting");

    let host = config.server.host.clone();
    let port = config.server.port;
    let cors_origins = config.server.cors_origins.clone();

    let (state, background) = bootstrap(config);

    let cors_layer = build_cors_layer(&cors_origins);
    let app = sa_gateway::api::router(state).layer(cors_layer);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "gateway listening");

    let shutdown_token = background.token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await
        .context("axum server error")?;

    shutdown_token.cancel();
    let drain = tokio::time::timeout(Duration::from_secs(300), futures_util::future::join_all(background.handles)).await;
    match drain {
        Ok(_) => tracing::info!("background tasks drained"),
        Err(_) => tracing::warn!("graceful shutdown timed out waiting on background tasks"),
    }

    Ok(())
}

async fn shutdown_signal(token: tokio_util::sync::CancellationToken) {
    let ctrl_c = async { tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to install SIGTERM handler").recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining in-flight work");
    token.cancel();
}

/// Special case: a single `"*"` entry means fully permissive CORS.
/// Otherwise only the listed origins are allowed.
fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    use axum::http::header;

    if cors_origins.len() == 1 && cors_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    }

    let exact: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(exact))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
