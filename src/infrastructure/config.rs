use crate::application::poller::PollerConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/telemetry";
const ENV_PREFIX: &str = "COPILOT";

/// Slack between the HTTP client's timeout and the poller's outer bound
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_millis(1_000);

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub feed: FeedSettings,
    pub poller: PollerSettings,
    pub case_studies: CaseStudySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub url: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

/// Geographic filter understood by the OpenSky states endpoint
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lomin: f64,
    pub lamax: f64,
    pub lomax: f64,
}

impl BoundingBox {
    pub fn query_pairs(&self) -> [(&'static str, f64); 4] {
        [
            ("lamin", self.lamin),
            ("lomin", self.lomin),
            ("lamax", self.lamax),
            ("lomax", self.lomax),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerSettings {
    pub interval_ms: u64,
    pub record_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseStudySettings {
    pub backend_url: String,
    pub query: String,
    pub timeout_ms: u64,
}

impl FeedSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CaseStudySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.poller.interval_ms),
            record_limit: self.poller.record_limit,
            fetch_timeout: self.feed.timeout() + POLL_TIMEOUT_MARGIN,
        }
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("feed.url", "https://opensky-network.org/api/states/all")?
        .set_default("feed.timeout_ms", 5_000_i64)?
        .set_default("poller.interval_ms", 30_000_i64)?
        .set_default("poller.record_limit", 15_i64)?
        .set_default("case_studies.backend_url", "http://localhost:8000")?
        .set_default("case_studies.query", "terrain alert ignored")?
        .set_default("case_studies.timeout_ms", 5_000_i64)
}

/// Defaults, then `config/telemetry.*` if present, then `COPILOT_*` variables
/// (e.g. `COPILOT_POLLER__INTERVAL_MS=5000`).
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = with_defaults(config::Config::builder())?
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
