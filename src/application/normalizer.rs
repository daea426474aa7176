// Normalizer - raw feed state vectors to bounded flight records
use crate::domain::flight::{FlightRecord, RawStateVector};

pub const DEFAULT_RECORD_LIMIT: usize = 15;

/// Keep the vectors with a complete position, in feed order, capped at `limit`.
///
/// Pure and infallible: malformed entries are dropped, never reported.
pub fn normalize(raw: &[RawStateVector], limit: usize) -> Vec<FlightRecord> {
    raw.iter()
        .filter_map(FlightRecord::from_state_vector)
        .take(limit)
        .collect()
}
