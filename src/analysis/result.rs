use serde::{Deserialize, Serialize};

/// Outcome of a completed analysis, immutable once attached to an upload.
///
/// The mock provider produces the summary shape; the real provider returns
/// its own scored structure, which is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Summary {
        #[serde(rename = "skinType")]
        skin_type: String,
        issues: Vec<String>,
        routine: Vec<String>,
    },
    Scored(serde_json::Value),
}

impl AnalysisResult {
    /// The fixed result served in mock mode.
    pub fn mock_summary() -> Self {
        AnalysisResult::Summary {
            skin_type: "Combination".into(),
            issues: vec!["Dryness".into(), "Mild acne".into()],
            routine: vec![
                "Gentle cleanser twice daily".into(),
                "Oil-free moisturizer".into(),
                "Broad-spectrum SPF 30 in the morning".into(),
            ],
        }
    }
}
