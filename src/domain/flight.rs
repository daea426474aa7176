// Flight domain models
use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNKNOWN_ID: &str = "unknown";
const UNKNOWN_CALLSIGN: &str = "N/A";
const UNKNOWN_COUNTRY: &str = "Unknown";

// Positions within an OpenSky state vector
const IDX_ICAO24: usize = 0;
const IDX_CALLSIGN: usize = 1;
const IDX_ORIGIN_COUNTRY: usize = 2;
const IDX_LONGITUDE: usize = 5;
const IDX_LATITUDE: usize = 6;
const IDX_BARO_ALTITUDE: usize = 7;
const IDX_ON_GROUND: usize = 8;
const IDX_VELOCITY: usize = 9;
const IDX_VERTICAL_RATE: usize = 11;

/// One aircraft's state vector exactly as the feed sent it.
///
/// The feed sends each vector as a heterogeneous JSON array and gives no
/// per-field guarantees, so the value is kept untyped and every accessor
/// answers `None` for anything missing, null or of the wrong type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawStateVector(Value);

impl RawStateVector {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    fn field(&self, idx: usize) -> Option<&Value> {
        self.0.as_array().and_then(|fields| fields.get(idx))
    }

    fn text(&self, idx: usize) -> Option<String> {
        self.field(idx)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn number(&self, idx: usize) -> Option<f64> {
        self.field(idx)
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
    }

    pub fn icao24(&self) -> Option<String> {
        self.text(IDX_ICAO24)
    }

    pub fn callsign(&self) -> Option<String> {
        self.text(IDX_CALLSIGN)
    }

    pub fn origin_country(&self) -> Option<String> {
        self.text(IDX_ORIGIN_COUNTRY)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.number(IDX_LONGITUDE)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.number(IDX_LATITUDE)
    }

    pub fn altitude(&self) -> Option<f64> {
        self.number(IDX_BARO_ALTITUDE)
    }

    pub fn on_ground(&self) -> Option<bool> {
        self.field(IDX_ON_GROUND).and_then(Value::as_bool)
    }

    pub fn velocity(&self) -> Option<f64> {
        self.number(IDX_VELOCITY)
    }

    pub fn vertical_rate(&self) -> Option<f64> {
        self.number(IDX_VERTICAL_RATE)
    }
}

impl From<Value> for RawStateVector {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Canonical flight record handed to the visual consumers.
///
/// Latitude, longitude and altitude are always finite; the other fields fall
/// back to sentinels when the feed omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub id: String,
    pub callsign: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub velocity: f64,
    pub vertical_rate: f64,
    pub on_ground: bool,
}

impl FlightRecord {
    /// Build a record from a raw vector, or `None` if its position is incomplete.
    pub fn from_state_vector(raw: &RawStateVector) -> Option<Self> {
        let longitude = raw.longitude()?;
        let latitude = raw.latitude()?;
        let altitude = raw.altitude()?;

        Some(Self {
            id: raw.icao24().unwrap_or_else(|| UNKNOWN_ID.to_string()),
            callsign: raw.callsign().unwrap_or_else(|| UNKNOWN_CALLSIGN.to_string()),
            country: raw.origin_country().unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
            latitude,
            longitude,
            altitude,
            velocity: raw.velocity().unwrap_or(0.0),
            vertical_rate: raw.vertical_rate().unwrap_or(0.0),
            on_ground: raw.on_ground().unwrap_or(false),
        })
    }

    pub fn has_callsign(&self) -> bool {
        self.callsign != UNKNOWN_CALLSIGN
    }

    /// Label shown next to the aircraft: callsign if known, else the transponder id.
    pub fn label(&self) -> &str {
        if self.has_callsign() {
            &self.callsign
        } else {
            &self.id
        }
    }

    pub fn has_valid_position(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.altitude.is_finite()
    }
}

/// A labeled point as the globe renderer expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub label: String,
}

impl From<&FlightRecord> for GlobePoint {
    fn from(flight: &FlightRecord) -> Self {
        Self {
            latitude: flight.latitude,
            longitude: flight.longitude,
            altitude: flight.altitude,
            label: flight.label().to_string(),
        }
    }
}

/// One entry of the scrolling ticker strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerEntry {
    pub id: String,
    pub callsign: String,
    pub country: String,
    pub line: String,
}

impl From<&FlightRecord> for TickerEntry {
    fn from(flight: &FlightRecord) -> Self {
        let height = if flight.on_ground {
            "on ground".to_string()
        } else {
            format!("{:.0} m", flight.altitude)
        };
        let line = format!(
            "{} · {} · {} · {:.0} m/s",
            flight.label(),
            flight.country,
            height,
            flight.velocity
        );

        Self {
            id: flight.id.clone(),
            callsign: flight.callsign.clone(),
            country: flight.country.clone(),
            line,
        }
    }
}
