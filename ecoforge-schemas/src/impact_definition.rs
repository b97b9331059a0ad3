use serde::{Deserialize, Serialize};

/// Normalization and weighting factors of one trigram inside one aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighting {
    pub normalization: Option<f64>,
    pub weighting: Option<f64>,
}

/// One term of a corrected (`*-c`) indicator: `weighting · sub-impact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    #[serde(rename = "sub-impact")]
    pub sub_impact: String,
    pub weighting: f64,
}

/// An entry of `impacts.json`, keyed by trigram in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactDefinition {
    pub label_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub pef: Option<Weighting>,
    #[serde(default)]
    pub ecoscore: Option<Weighting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<Vec<CorrectionEntry>>,
}
