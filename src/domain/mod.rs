// Domain layer - Flight telemetry and incident models
pub mod case_study;
pub mod flight;
pub mod incident;
pub mod snapshot;
