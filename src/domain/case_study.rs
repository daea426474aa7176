// Crash case study domain model
use super::snapshot::Provenance;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub flight_id: String,
    pub summary: String,
    pub top_reason: String,
    pub learnings: String,
}

impl CaseStudy {
    pub fn new(flight_id: &str, summary: &str, top_reason: &str, learnings: &str) -> Self {
        Self {
            flight_id: flight_id.to_string(),
            summary: summary.to_string(),
            top_reason: top_reason.to_string(),
            learnings: learnings.to_string(),
        }
    }
}

/// Case studies plus whether they came from the backend or the embedded set
#[derive(Debug, Clone, Serialize)]
pub struct CaseStudyList {
    pub provenance: Provenance,
    pub studies: Vec<CaseStudy>,
}
