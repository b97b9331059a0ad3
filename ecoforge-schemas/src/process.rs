use crate::activity::{Scope, Unit};
use crate::impacts::Impacts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessMetadata {
    pub complements: BTreeMap<String, f64>,
}

/// The published form of a catalog activity, with impacts attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: String,
    pub activity_name: String,
    pub display_name: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub categories: Vec<String>,
    pub scopes: Vec<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "elecMJ")]
    pub elec_mj: f64,
    #[serde(rename = "heatMJ")]
    pub heat_mj: f64,
    pub waste: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_per_unit: Option<f64>,
    pub impacts: Impacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProcessMetadata>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenericComplements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest: Option<f64>,
}

/// An object variant published in `processes_generic.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericProcess {
    pub id: String,
    pub display_name: String,
    pub process_id: String,
    pub complements: GenericComplements,
}
