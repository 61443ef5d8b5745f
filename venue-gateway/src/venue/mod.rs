//! In-memory venue state and flow counters.

mod seed;
mod simulator;

pub use seed::{seed_incidents, seed_sections};
pub use simulator::CrowdSimulator;

use chrono::Local;
use serde::Serialize;
use venue_common::{GateType, Incident, SectionStatus, VenueSection};

/// Errors from venue updates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VenueError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),
}

/// Outcome of applying a count to a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountUpdate {
    pub section_id: String,
    pub previous: u32,
    pub current: u32,
    pub status: SectionStatus,
}

/// Aggregated counters for the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTotals {
    pub total_inbound: u64,
    pub total_outbound: u64,
    pub net_occupancy: u64,
}

/// Sections, incidents and flow counters mutated locally.
#[derive(Debug, Clone)]
pub struct VenueState {
    sections: Vec<VenueSection>,
    incidents: Vec<Incident>,
    total_inbound: u64,
    total_outbound: u64,
    last_sync: Option<String>,
}

impl VenueState {
    pub fn new(sections: Vec<VenueSection>, incidents: Vec<Incident>) -> Self {
        Self {
            sections,
            incidents,
            total_inbound: 0,
            total_outbound: 0,
            last_sync: None,
        }
    }

    /// The demo venue.
    pub fn seeded() -> Self {
        Self::new(seed_sections(), seed_incidents())
    }

    pub fn sections(&self) -> &[VenueSection] {
        &self.sections
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn section(&self, id: &str) -> Option<&VenueSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn incident(&self, id: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    pub fn last_sync(&self) -> Option<&str> {
        self.last_sync.as_deref()
    }

    pub fn totals(&self) -> FlowTotals {
        FlowTotals {
            total_inbound: self.total_inbound,
            total_outbound: self.total_outbound,
            net_occupancy: self.total_inbound.saturating_sub(self.total_outbound),
        }
    }

    /// Set a section's occupancy, stamped with the local wall clock.
    pub fn apply_count(&mut self, section_id: &str, count: u32) -> Result<CountUpdate, VenueError> {
        let now = Local::now().format("%H:%M:%S").to_string();
        self.apply_count_at(section_id, count, now)
    }

    /// Set a section's occupancy and recompute its status.
    ///
    /// A rise at an entrance counts as inbound, a rise at an exit as outbound.
    pub fn apply_count_at(
        &mut self,
        section_id: &str,
        count: u32,
        timestamp: String,
    ) -> Result<CountUpdate, VenueError> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| VenueError::UnknownSection(section_id.to_string()))?;

        let previous = section.occupancy;
        if count > previous {
            let rise = u64::from(count - previous);
            match section.gate_type {
                GateType::Entrance => self.total_inbound += rise,
                GateType::Exit => self.total_outbound += rise,
                GateType::Zone => {}
            }
        }

        section.occupancy = count;
        section.status = SectionStatus::from_load(count, section.capacity);
        section.last_analyzed = Some(timestamp.clone());
        let update = CountUpdate {
            section_id: section.id.clone(),
            previous,
            current: count,
            status: section.status,
        };
        self.last_sync = Some(timestamp);

        tracing::debug!(
            "Section {} occupancy {} -> {} ({})",
            update.section_id,
            previous,
            count,
            update.status
        );
        Ok(update)
    }

    /// Set a section's flow rate (people per minute).
    pub fn set_flow_rate(&mut self, section_id: &str, flow_rate: u32) -> Result<(), VenueError> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| VenueError::UnknownSection(section_id.to_string()))?;
        section.flow_rate = flow_rate;
        Ok(())
    }
}

impl Default for VenueState {
    fn default() -> Self {
        Self::seeded()
    }
}
