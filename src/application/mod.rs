// Application layer - Telemetry pipeline and use cases
pub mod case_study_service;
pub mod fallback;
pub mod flight_views;
pub mod normalizer;
pub mod poller;
pub mod snapshot_hub;
pub mod state_feed;
