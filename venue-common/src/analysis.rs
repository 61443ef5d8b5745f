//! AI analysis result types returned to dashboard consumers.

use serde::{Deserialize, Serialize};

/// Tactical response for a reported incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticalResponse {
    pub priority: String,
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_route: Option<String>,
    pub risk_assessment: String,
}

impl TacticalResponse {
    /// Whether all required fields carry content.
    pub fn is_well_formed(&self) -> bool {
        !self.priority.trim().is_empty()
            && !self.risk_assessment.trim().is_empty()
            && !self.actions.is_empty()
            && self.actions.iter().all(|a| !a.trim().is_empty())
    }
}

/// A crowd hotspot on the venue schematic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityCluster {
    /// Horizontal position, 0..=100.
    pub x: f64,
    /// Vertical position, 0..=100.
    pub y: f64,
    /// Crowd intensity, 0..=1.
    pub intensity: f64,
}

impl DensityCluster {
    /// Intensity above which a cluster is flagged as a hotspot.
    pub const HOTSPOT_INTENSITY: f64 = 0.6;

    /// Clamp all fields into their valid ranges. Non-finite values become 0.
    pub fn clamped(self) -> Self {
        fn clamp(v: f64, max: f64) -> f64 {
            if v.is_finite() {
                v.clamp(0.0, max)
            } else {
                0.0
            }
        }
        Self {
            x: clamp(self.x, 100.0),
            y: clamp(self.y, 100.0),
            intensity: clamp(self.intensity, 1.0),
        }
    }

    pub fn is_hotspot(&self) -> bool {
        self.intensity > Self::HOTSPOT_INTENSITY
    }
}
