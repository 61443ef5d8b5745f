//! Locally computed results used when no real inference is available.

use venue_common::{DensityCluster, FailureKind, TacticalResponse, VenueSection};

pub const INSIGHT_STANDBY: &str =
    "AI insights on standby (API quota reached). Local monitoring active.";
pub const INSIGHT_UNAVAILABLE: &str =
    "Local monitoring active. External AI insights currently offline.";
pub const INSIGHT_EMPTY: &str = "Monitoring systems active. No anomalies detected.";

/// Returned while degraded mode is active.
pub fn standby_tactical_response() -> TacticalResponse {
    TacticalResponse {
        priority: "Standby".to_string(),
        actions: vec![
            "Initiate standard emergency protocols".to_string(),
            "Dispatch nearest security unit".to_string(),
            "Coordinate with on-site staff over radio".to_string(),
        ],
        suggested_route: None,
        risk_assessment: "AI analysis is on standby due to API quota limits. \
                          Proceed with manual triage."
            .to_string(),
    }
}

/// Returned when a real call failed or produced unusable output.
pub fn fallback_tactical_response() -> TacticalResponse {
    TacticalResponse {
        priority: "High (Fallback)".to_string(),
        actions: vec![
            "Initiate standard emergency protocols".to_string(),
            "Dispatch nearest security unit".to_string(),
            "Maintain verbal communication with site".to_string(),
        ],
        suggested_route: None,
        risk_assessment: "Automated analysis unavailable. Please proceed with manual triage."
            .to_string(),
    }
}

/// One cluster per section on a square grid, intensity from section load.
pub fn synthetic_density_map(sections: &[VenueSection]) -> Vec<DensityCluster> {
    if sections.is_empty() {
        return Vec::new();
    }
    let columns = (sections.len() as f64).sqrt().ceil() as usize;
    let rows = sections.len().div_ceil(columns);
    let cell_width = 100.0 / columns as f64;
    let cell_height = 100.0 / rows as f64;

    sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let column = i % columns;
            let row = i / columns;
            DensityCluster {
                x: cell_width * (column as f64 + 0.5),
                y: cell_height * (row as f64 + 0.5),
                intensity: section.load_ratio(),
            }
        })
        .collect()
}

/// Banner text for a classified failure.
pub fn failure_message(kind: FailureKind, cooldown_secs: u64, detail: &str) -> String {
    match kind {
        FailureKind::Quota => format!(
            "API quota limit reached. AI features are on standby for {}s; wait or connect a paid API key.",
            cooldown_secs
        ),
        FailureKind::Key => {
            "API key missing or rejected. Please connect a valid API key in settings.".to_string()
        }
        FailureKind::Generic => format!("AI inference failed: {}", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venue_common::GateType;

    #[test]
    fn test_fallbacks_are_well_formed() {
        assert!(standby_tactical_response().is_well_formed());
        assert!(fallback_tactical_response().is_well_formed());
        assert_ne!(
            standby_tactical_response().priority,
            fallback_tactical_response().priority
        );
    }

    #[test]
    fn test_synthetic_density_map_layout() {
        let sections: Vec<_> = (0..5)
            .map(|i| VenueSection::new(&format!("S{i}"), "s", i * 20, 100, 0, GateType::Zone))
            .collect();
        let clusters = synthetic_density_map(&sections);
        assert_eq!(clusters.len(), 5);
        // 5 sections -> 3 columns, 2 rows
        assert_eq!(clusters[0].x, 100.0 / 6.0);
        assert_eq!(clusters[3].y, 75.0);
        assert_eq!(clusters[4].intensity, 0.8);
        assert!(clusters
            .iter()
            .all(|c| (0.0..=100.0).contains(&c.x) && (0.0..=100.0).contains(&c.y)));
    }

    #[test]
    fn test_synthetic_density_map_empty() {
        assert!(synthetic_density_map(&[]).is_empty());
    }

    #[test]
    fn test_failure_messages_are_readable() {
        assert!(failure_message(FailureKind::Quota, 60, "").contains("60s"));
        assert!(failure_message(FailureKind::Key, 60, "").contains("API key"));
        assert_eq!(
            failure_message(FailureKind::Generic, 60, "timed out"),
            "AI inference failed: timed out"
        );
    }
}
