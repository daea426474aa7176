// HTTP request handlers
use crate::domain::incident::{INCIDENTS, Incident, find_incident};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::snapshot_stream::stream_from_hub;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct IncidentDetail {
    #[serde(flatten)]
    incident: &'static Incident,
    chat_path: String,
}

async fn respond<T: Serialize + ?Sized>(data: &T, compress: bool) -> Response {
    match json_response(data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest telemetry snapshot
pub async fn latest_flights(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.current_snapshot();
    respond(snapshot.as_ref(), accepts_brotli(&headers)).await
}

/// Stream every snapshot as it is published (progressive updates)
pub async fn stream_flights(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    stream_from_hub(&state.hub, accepts_brotli(&headers))
}

pub async fn globe_points(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let globe = state.globe.current();
    respond(globe.as_ref(), accepts_brotli(&headers)).await
}

pub async fn ticker(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let ticker = state.ticker.current();
    respond(ticker.as_ref(), accepts_brotli(&headers)).await
}

pub async fn list_incidents(headers: HeaderMap) -> Response {
    respond(&INCIDENTS[..], accepts_brotli(&headers)).await
}

/// One incident plus the route of its chat simulation
pub async fn get_incident(Path(id): Path<String>, headers: HeaderMap) -> Response {
    match find_incident(&id) {
        Some(incident) => {
            let detail = IncidentDetail {
                incident,
                chat_path: incident.chat_path(),
            };
            respond(&detail, accepts_brotli(&headers)).await
        }
        None => (StatusCode::NOT_FOUND, format!("Unknown incident {}", id)).into_response(),
    }
}

/// Crash case studies, falling back to the embedded set when the backend fails
pub async fn case_studies(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let list = state.case_study_service.case_studies().await;
    respond(&list, accepts_brotli(&headers)).await
}
