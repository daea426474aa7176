// Historic incident catalog offered for copilot simulation
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    pub id: &'static str,
    pub title: &'static str,
    pub date: &'static str,
    pub location: &'static str,
    pub cause: &'static str,
}

impl Incident {
    /// Route of the chat simulation for this flight
    pub fn chat_path(&self) -> String {
        format!("/chat/{}", self.id)
    }
}

pub static INCIDENTS: [Incident; 5] = [
    Incident {
        id: "KAL801",
        title: "Korean Air Flight 801",
        date: "August 6, 1997",
        location: "Guam",
        cause: "Pilot descended below glide slope despite warnings",
    },
    Incident {
        id: "TURKISH1951",
        title: "Turkish Airlines Flight 1951",
        date: "February 25, 2009",
        location: "Amsterdam",
        cause: "Radio altimeter failure & autopilot mismanagement",
    },
    Incident {
        id: "ASIANA214",
        title: "Asiana Airlines Flight 214",
        date: "July 6, 2013",
        location: "San Francisco",
        cause: "Low-speed approach with inadequate manual correction",
    },
    Incident {
        id: "AIRFRANCE447",
        title: "Air France Flight 447",
        date: "June 1, 2009",
        location: "Atlantic Ocean",
        cause: "Inconsistent speed readings → Stall → Crew disorientation",
    },
    Incident {
        id: "COLGAN3407",
        title: "Colgan Air Flight 3407",
        date: "February 12, 2009",
        location: "Buffalo, NY",
        cause: "Stall due to pilot error & improper stick control",
    },
];

pub fn find_incident(id: &str) -> Option<&'static Incident> {
    INCIDENTS.iter().find(|i| i.id.eq_ignore_ascii_case(id))
}
