//! Venue layout and incident types.

use serde::{Deserialize, Serialize};

/// Crowd status of a venue section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Normal,
    Congested,
    Critical,
}

impl SectionStatus {
    /// Load ratio above which a section is critical.
    pub const CRITICAL_RATIO: f64 = 0.9;
    /// Load ratio above which a section is congested.
    pub const CONGESTED_RATIO: f64 = 0.7;

    /// Derive the status from an occupancy against a capacity.
    ///
    /// A zero capacity section is critical as soon as anyone is in it.
    pub fn from_load(occupancy: u32, capacity: u32) -> Self {
        let occupancy = f64::from(occupancy);
        let capacity = f64::from(capacity);
        if occupancy > capacity * Self::CRITICAL_RATIO {
            SectionStatus::Critical
        } else if occupancy > capacity * Self::CONGESTED_RATIO {
            SectionStatus::Congested
        } else {
            SectionStatus::Normal
        }
    }
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionStatus::Normal => write!(f, "normal"),
            SectionStatus::Congested => write!(f, "congested"),
            SectionStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Role of a section in the venue's flow.
///
/// Entrances and exits drive the inbound/outbound counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateType {
    Entrance,
    Exit,
    #[default]
    Zone,
}

/// A monitored area of the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSection {
    pub id: String,
    pub name: String,
    pub occupancy: u32,
    pub capacity: u32,
    pub status: SectionStatus,
    /// People per minute.
    pub flow_rate: u32,
    /// Time of the last camera scan (HH:MM:SS), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analyzed: Option<String>,
    #[serde(default)]
    pub gate_type: GateType,
}

impl VenueSection {
    pub fn new(
        id: &str,
        name: &str,
        occupancy: u32,
        capacity: u32,
        flow_rate: u32,
        gate_type: GateType,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            occupancy,
            capacity,
            status: SectionStatus::from_load(occupancy, capacity),
            flow_rate,
            last_analyzed: None,
            gate_type,
        }
    }

    /// Override the derived status (seed data carries hand-set statuses).
    pub fn with_status(mut self, status: SectionStatus) -> Self {
        self.status = status;
        self
    }

    /// Occupancy as a fraction of capacity, clamped to `[0, 1]`.
    pub fn load_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return if self.occupancy > 0 { 1.0 } else { 0.0 };
        }
        (f64::from(self.occupancy) / f64::from(self.capacity)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Medical,
    Fire,
    Security,
    Structural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Active,
    Responding,
    Resolved,
}

/// A logged incident shown on the incidents board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub location: String,
    pub severity: Severity,
    pub timestamp: String,
    pub description: String,
    pub status: IncidentStatus,
}

/// Free-form incident description submitted for a tactical response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl From<&Incident> for IncidentReport {
    fn from(incident: &Incident) -> Self {
        let category = serde_json::to_value(incident.incident_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            category,
            location: incident.location.clone(),
            description: incident.description.clone(),
        }
    }
}
