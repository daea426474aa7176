// Case study service - similar-crash lookup with embedded fallback
use crate::application::fallback::fallback_case_studies;
use crate::domain::case_study::{CaseStudy, CaseStudyList};
use crate::domain::snapshot::Provenance;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CaseStudySource: Send + Sync {
    /// Case studies of crashes similar to `query`
    async fn similar_crashes(&self, query: &str) -> anyhow::Result<Vec<CaseStudy>>;
}

#[derive(Clone)]
pub struct CaseStudyService {
    source: Arc<dyn CaseStudySource>,
    query: String,
}

impl CaseStudyService {
    pub fn new(source: Arc<dyn CaseStudySource>, query: String) -> Self {
        Self { source, query }
    }

    pub async fn case_studies(&self) -> CaseStudyList {
        match self.source.similar_crashes(&self.query).await {
            Ok(studies) => CaseStudyList {
                provenance: Provenance::Live,
                studies,
            },
            Err(e) => {
                tracing::warn!("Error fetching case studies, using fallback set: {:#}", e);
                CaseStudyList {
                    provenance: Provenance::Fallback,
                    studies: fallback_case_studies(),
                }
            }
        }
    }
}
