use crate::activity::Cff;
use serde::{Deserialize, Serialize};

/// The textile-scope view of a material activity, written to `materials.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub alias: String,
    pub name: String,
    pub short_name: String,
    pub process_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_country: Option<String>,
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycled_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cff: Option<Cff>,
}
