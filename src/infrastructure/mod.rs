// Infrastructure layer - External dependencies and adapters
pub mod case_study_client;
pub mod config;
pub mod http_response;
pub mod opensky_feed;
pub mod snapshot_stream;
