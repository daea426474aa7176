// Globe and ticker consumers - derived view state rebuilt from each snapshot
use crate::application::snapshot_hub::{SnapshotHub, SubscriptionId};
use crate::domain::flight::{GlobePoint, TickerEntry};
use crate::domain::snapshot::{Provenance, TelemetrySnapshot};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Serialize)]
pub struct GlobeState {
    pub provenance: Provenance,
    pub sequence: u64,
    pub points: Vec<GlobePoint>,
}

impl From<&TelemetrySnapshot> for GlobeState {
    fn from(snapshot: &TelemetrySnapshot) -> Self {
        Self {
            provenance: snapshot.provenance,
            sequence: snapshot.sequence,
            points: snapshot.globe_points(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerState {
    pub provenance: Provenance,
    pub sequence: u64,
    pub entries: Vec<TickerEntry>,
}

impl From<&TelemetrySnapshot> for TickerState {
    fn from(snapshot: &TelemetrySnapshot) -> Self {
        Self {
            provenance: snapshot.provenance,
            sequence: snapshot.sequence,
            entries: snapshot.ticker_entries(),
        }
    }
}

/// Holds the latest state derived for one visual consumer
pub struct FlightView<S> {
    state: Arc<RwLock<Arc<S>>>,
}

impl<S> Clone for FlightView<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S> FlightView<S>
where
    S: for<'a> From<&'a TelemetrySnapshot> + Send + Sync + 'static,
{
    /// Seed the view from `initial` and keep it current from `hub`
    pub fn attach(hub: &SnapshotHub, initial: &TelemetrySnapshot) -> (Self, SubscriptionId) {
        let view = Self {
            state: Arc::new(RwLock::new(Arc::new(S::from(initial)))),
        };
        let sink = view.clone();
        let id = hub.subscribe(move |snapshot| sink.render(&snapshot));
        (view, id)
    }

    fn render(&self, snapshot: &TelemetrySnapshot) {
        let next = Arc::new(S::from(snapshot));
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn current(&self) -> Arc<S> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub type GlobeView = FlightView<GlobeState>;
pub type TickerView = FlightView<TickerState>;
