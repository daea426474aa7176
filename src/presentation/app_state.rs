// Application state for HTTP handlers
use crate::application::case_study_service::CaseStudyService;
use crate::application::fallback::fallback_flights;
use crate::application::flight_views::{GlobeView, TickerView};
use crate::application::snapshot_hub::SnapshotHub;
use crate::domain::snapshot::TelemetrySnapshot;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub hub: SnapshotHub,
    pub globe: GlobeView,
    pub ticker: TickerView,
    pub case_study_service: CaseStudyService,
}

impl AppState {
    /// Wire the globe and ticker views to `hub`
    pub fn new(hub: SnapshotHub, case_study_service: CaseStudyService) -> Self {
        let seed = seed_snapshot();
        let (globe, _) = GlobeView::attach(&hub, &seed);
        let (ticker, _) = TickerView::attach(&hub, &seed);
        Self {
            hub,
            globe,
            ticker,
            case_study_service,
        }
    }

    /// Latest published snapshot, or the fallback seed before the first cycle lands
    pub fn current_snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.hub
            .latest()
            .unwrap_or_else(|| Arc::new(seed_snapshot()))
    }
}

fn seed_snapshot() -> TelemetrySnapshot {
    TelemetrySnapshot::fallback(0, fallback_flights())
}
