use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exchange {
    /// Input from another dataset of the same database, per unit of production.
    Technosphere { input: String, amount: f64 },
    /// Elementary flow exchanged with the environment.
    Biosphere {
        flow: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compartment: Option<String>,
        amount: f64,
    },
}

/// A unit process of an LCI database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub unit: String,
    /// Negative for waste treatments.
    pub production_amount: f64,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Dataset {
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// `+1` or `-1` following the sign of the production amount.
    pub fn production_sign(&self) -> f64 {
        if self.production_amount < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}
