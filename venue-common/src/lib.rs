//! SafeFlow Common Types
//!
//! Shared types used by the inference gateway and its dashboard consumers.

pub mod analysis;
pub mod failure;
pub mod venue;

pub use analysis::{DensityCluster, TacticalResponse};
pub use failure::{FailureEvent, FailureKind};
pub use venue::{
    GateType, Incident, IncidentReport, IncidentStatus, IncidentType, SectionStatus, Severity,
    VenueSection,
};
