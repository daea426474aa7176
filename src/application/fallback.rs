// Embedded demo data used whenever the live sources are unavailable
use crate::domain::case_study::CaseStudy;
use crate::domain::flight::FlightRecord;
use std::sync::{Arc, LazyLock};

fn demo_flight(
    id: &str,
    callsign: &str,
    country: &str,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    velocity: f64,
) -> FlightRecord {
    FlightRecord {
        id: id.to_string(),
        callsign: callsign.to_string(),
        country: country.to_string(),
        latitude,
        longitude,
        altitude,
        velocity,
        vertical_rate: 0.0,
        on_ground: false,
    }
}

static FALLBACK_FLIGHTS: LazyLock<Arc<[FlightRecord]>> = LazyLock::new(|| {
    Arc::from(vec![
        demo_flight("a1b2c3", "UAL123", "United States", 37.62, -122.38, 10668.0, 250.0),
        demo_flight("400f2a", "BAW456", "United Kingdom", 51.47, -0.45, 11277.0, 240.0),
        demo_flight("3944ef", "AFR447", "France", 49.01, 2.55, 10972.0, 245.0),
        demo_flight("71be01", "KAL801", "Republic of Korea", 37.46, 126.44, 9753.0, 230.0),
    ])
});

/// The shared fallback flight set. Every caller gets the same allocation.
pub fn fallback_flights() -> Arc<[FlightRecord]> {
    FALLBACK_FLIGHTS.clone()
}

pub fn fallback_case_studies() -> Vec<CaseStudy> {
    vec![
        CaseStudy::new(
            "Turkish Airlines Flight 1951",
            "Crashed short of the runway at Amsterdam due to faulty radio altimeter and delayed pilot response.",
            "Radio altimeter malfunction and pilot confusion",
            "AI Copilot could have flagged the unreliable altimeter readings and prompted corrective action before stall conditions.",
        ),
        CaseStudy::new(
            "Korean Air Flight 801",
            "Crashed into terrain near Guam due to pilot fatigue and ignored terrain proximity warnings during approach.",
            "Pilot fatigue and ignored terrain warnings",
            "AI Copilot could have provided enhanced terrain awareness alerts and fatigue monitoring to prevent critical decision errors.",
        ),
        CaseStudy::new(
            "Air France Flight 447",
            "Crashed into Atlantic Ocean due to pilot confusion and incorrect stall recovery procedures at high altitude.",
            "Pilot error in stall recovery",
            "AI Copilot could have detected the aerodynamic stall early and provided real-time recovery guidance to prevent loss of control.",
        ),
        CaseStudy::new(
            "US Airways Flight 1549",
            "Successfully landed on Hudson River after bird strike disabled both engines, saving all 155 passengers.",
            "Bird strike and engine failure",
            "AI Copilot could have assisted with emergency landing site selection and optimal glide path calculations for maximum survivability.",
        ),
    ]
}
