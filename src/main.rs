// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{future::IntoFuture, net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::case_study_service::CaseStudyService;
use crate::application::poller::TelemetryPoller;
use crate::application::snapshot_hub::SnapshotHub;
use crate::infrastructure::case_study_client::CaseStudyClient;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::opensky_feed::OpenSkyFeed;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    case_studies, get_incident, globe_points, health_check, latest_flights, list_incidents,
    stream_flights, ticker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;
    let http_client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    // Feeds and sources (infrastructure layer)
    let feed = Arc::new(OpenSkyFeed::from_settings(http_client.clone(), &config.feed));
    let case_study_source = Arc::new(CaseStudyClient::from_settings(http_client, &config.case_studies));

    // One poller shared by every consumer through the hub (application layer)
    let hub = SnapshotHub::new();
    let poller = TelemetryPoller::new(feed, config.poller_config());
    let case_study_service = CaseStudyService::new(case_study_source, config.case_studies.query.clone());

    let state = Arc::new(AppState::new(hub.clone(), case_study_service));
    let poller_handle = poller.start(hub.publisher());
    tracing::info!(
        "Poller {} feeding {} snapshot consumers",
        poller_handle.id(),
        hub.subscriber_count()
    );

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/flights", get(latest_flights))
        .route("/flights/stream", get(stream_flights))
        .route("/globe/points", get(globe_points))
        .route("/ticker", get(ticker))
        .route("/incidents", get(list_incidents))
        .route("/incidents/:id", get(get_incident))
        .route("/case-studies", get(case_studies))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting copilot-telemetry service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::select! {
        result = axum::serve(listener, router).into_future() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown requested"),
    }

    poller_handle.stop();
    tracing::info!("Poller {} stopped, shutting down", poller_handle.id());
    Ok(())
}
