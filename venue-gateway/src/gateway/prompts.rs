//! Prompt text and response schemas.

use serde_json::{json, Value};
use venue_common::{IncidentReport, VenueSection};

pub const COUNT_PEOPLE: &str = "Count all people visible in this security camera frame. \
Return ONLY the number as digits. If no people are visible, return 0.";

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub fn tactical(incident: &IncidentReport, sections: &[VenueSection]) -> String {
    format!(
        "As a venue safety operations AI, provide a tactical response for this incident.\n\
         Incident: {}\n\
         Current venue status: {}\n\
         Respond with JSON only: {{\"priority\": \"Critical\" | \"High\" | \"Medium\" | \"Low\", \
         \"actions\": [\"Step 1\", ...], \"suggestedRoute\": \"brief evacuation path\", \
         \"riskAssessment\": \"strategic analysis of the threat\"}}",
        to_json(incident),
        to_json(sections)
    )
}

pub fn tactical_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "priority": { "type": "STRING" },
            "actions": { "type": "ARRAY", "items": { "type": "STRING" } },
            "suggestedRoute": { "type": "STRING" },
            "riskAssessment": { "type": "STRING" }
        },
        "required": ["priority", "actions", "riskAssessment"]
    })
}

pub fn insight(sections: &[VenueSection]) -> String {
    format!(
        "Provide a single, professional safety directive of at most 15 words based on this venue data: {}",
        to_json(sections)
    )
}

pub fn density_map(sections: &[VenueSection]) -> String {
    format!(
        "Estimate crowd density hotspots on a 100x100 venue schematic from this section data: {}\n\
         Respond with a JSON array of objects {{\"x\": 0-100, \"y\": 0-100, \"intensity\": 0-1}}.",
        to_json(sections)
    )
}

pub fn density_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "x": { "type": "NUMBER" },
                "y": { "type": "NUMBER" },
                "intensity": { "type": "NUMBER" }
            },
            "required": ["x", "y", "intensity"]
        }
    })
}
