//! Demo venue data.

use venue_common::{
    GateType, Incident, IncidentStatus, IncidentType, SectionStatus, Severity, VenueSection,
};

pub fn seed_sections() -> Vec<VenueSection> {
    use GateType::{Entrance, Exit, Zone};
    use SectionStatus::{Congested, Critical, Normal};

    [
        ("A1", "West Gate Entrance", 480, 500, Congested, 45, Entrance),
        ("B1", "Grand Stand North", 1200, 3000, Normal, 12, Zone),
        ("C1", "Concourse A (Food)", 920, 1000, Congested, 30, Zone),
        ("D1", "East Gate Exit", 200, 600, Normal, 80, Exit),
        ("E1", "VIP Lounge", 195, 200, Critical, 5, Zone),
        ("F1", "Media Center", 50, 100, Normal, 2, Zone),
        ("G1", "South Bleachers", 2800, 3000, Congested, 15, Zone),
        ("H1", "Main Plaza", 4500, 5000, Normal, 120, Zone),
    ]
    .into_iter()
    .map(|(id, name, occupancy, capacity, status, flow_rate, gate_type)| {
        VenueSection::new(id, name, occupancy, capacity, flow_rate, gate_type).with_status(status)
    })
    .collect()
}

pub fn seed_incidents() -> Vec<Incident> {
    vec![
        Incident {
            id: "INC-001".to_string(),
            incident_type: IncidentType::Medical,
            location: "Section B12".to_string(),
            severity: Severity::High,
            timestamp: "19:04".to_string(),
            description: "Spectator collapsed, suspected heat stroke. Medics dispatched."
                .to_string(),
            status: IncidentStatus::Responding,
        },
        Incident {
            id: "INC-002".to_string(),
            incident_type: IncidentType::Security,
            location: "West Gate Entrance".to_string(),
            severity: Severity::Medium,
            timestamp: "18:55".to_string(),
            description: "Ticket scanning hardware failure causing bottleneck.".to_string(),
            status: IncidentStatus::Active,
        },
        Incident {
            id: "INC-003".to_string(),
            incident_type: IncidentType::Fire,
            location: "Concourse A (Kitchen)".to_string(),
            severity: Severity::Low,
            timestamp: "18:30".to_string(),
            description: "Small grease fire contained by staff. Smoke cleared.".to_string(),
            status: IncidentStatus::Resolved,
        },
    ]
}
