// Telemetry snapshot domain model
use super::flight::{FlightRecord, GlobePoint, TickerEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Where the flights in a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

/// One immutable batch of flights published by a poll cycle.
///
/// Snapshots are shared behind `Arc` and never modified after publication.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub sequence: u64,
    pub provenance: Provenance,
    pub fetched_at: DateTime<Utc>,
    pub flights: Arc<[FlightRecord]>,
}

impl TelemetrySnapshot {
    pub fn live(sequence: u64, flights: Vec<FlightRecord>) -> Self {
        Self {
            sequence,
            provenance: Provenance::Live,
            fetched_at: Utc::now(),
            flights: flights.into(),
        }
    }

    pub fn fallback(sequence: u64, flights: Arc<[FlightRecord]>) -> Self {
        Self {
            sequence,
            provenance: Provenance::Fallback,
            fetched_at: Utc::now(),
            flights,
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn globe_points(&self) -> Vec<GlobePoint> {
        self.flights
            .iter()
            .filter(|flight| flight.has_valid_position())
            .map(GlobePoint::from)
            .collect()
    }

    pub fn ticker_entries(&self) -> Vec<TickerEntry> {
        self.flights.iter().map(TickerEntry::from).collect()
    }
}
