use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterizationFactor {
    pub flow: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment: Option<String>,
    pub value: f64,
}

/// One indicator of an LCIA method.
///
/// `code` is the short code used inside the pipeline (a trigram or a sub-impact such as
/// `etf1`); `name` is the full indicator name used by the remote oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub factors: Vec<CharacterizationFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub indicators: Vec<Indicator>,
}

impl Method {
    pub fn indicator_by_name(&self, name: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.name == name)
    }
}
