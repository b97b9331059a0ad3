use crate::impacts::Impacts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel `source` meaning the impacts are given inline in the catalog.
pub const CUSTOM_SOURCE: &str = "Custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Food,
    Textile,
    Object,
    Veli,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Food, Scope::Textile, Scope::Object, Scope::Veli];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Food => "food",
            Scope::Textile => "textile",
            Scope::Object => "object",
            Scope::Veli => "veli",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "kg", alias = "kilogram")]
    Kg,
    #[serde(rename = "t⋅km", alias = "tkm", alias = "ton kilometer")]
    TonKm,
    #[serde(rename = "kWh", alias = "kilowatt hour")]
    KWh,
    #[serde(rename = "MJ", alias = "megajoule")]
    MJ,
    #[serde(rename = "L", alias = "litre", alias = "liter")]
    L,
    #[serde(rename = "item", alias = "unit")]
    Item,
    #[serde(rename = "m²", alias = "m2", alias = "square meter")]
    SquareMeter,
    #[serde(rename = "m³", alias = "m3", alias = "cubic meter")]
    CubicMeter,
}

impl Unit {
    /// Maps a unit label, either the catalog spelling or the LCA toolkit one, into the
    /// closed unit set. Anything else is `None`.
    pub fn parse(label: &str) -> Option<Unit> {
        match label.trim() {
            "kg" | "kilogram" => Some(Unit::Kg),
            "t⋅km" | "tkm" | "ton kilometer" => Some(Unit::TonKm),
            "kWh" | "kilowatt hour" => Some(Unit::KWh),
            "MJ" | "megajoule" => Some(Unit::MJ),
            "L" | "l" | "litre" | "liter" => Some(Unit::L),
            "item" | "unit" | "p" => Some(Unit::Item),
            "m²" | "m2" | "square meter" => Some(Unit::SquareMeter),
            "m³" | "m3" | "cubic meter" => Some(Unit::CubicMeter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::TonKm => "t⋅km",
            Unit::KWh => "kWh",
            Unit::MJ => "MJ",
            Unit::L => "L",
            Unit::Item => "item",
            Unit::SquareMeter => "m²",
            Unit::CubicMeter => "m³",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Reference,
    Organic,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCooling {
    None,
    Always,
    OnceTransformed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_group1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_group2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal_product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_to_cooked_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inedible_part: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_cooling: Option<TransportCooling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_occupation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl FoodMetadata {
    /// Animal ingredients are identified by their livestock grouping.
    pub fn is_animal(&self) -> bool {
        self.animal_group1.is_some() || self.animal_group2.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cff {
    pub manufacturer_allocation: f64,
    pub recycled_quality_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cff: Option<Cff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycled_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// A sellable variant of an object-scope activity, published in `processes_generic.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectVariant {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest_management: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ObjectVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complements: Option<BTreeMap<String, f64>>,
}

/// Scope-specific catalog fields. A key present here must also be declared in the
/// activity's `scopes`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<FoodMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textile: Option<TextileMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veli: Option<ObjectMetadata>,
}

impl ScopedMetadata {
    /// Scopes for which a metadata block is present.
    pub fn declared_scopes(&self) -> Vec<Scope> {
        let mut scopes = Vec::new();
        if self.food.is_some() {
            scopes.push(Scope::Food);
        }
        if self.textile.is_some() {
            scopes.push(Scope::Textile);
        }
        if self.object.is_some() {
            scopes.push(Scope::Object);
        }
        if self.veli.is_some() {
            scopes.push(Scope::Veli);
        }
        scopes
    }

    pub fn object_like(&self) -> impl Iterator<Item = &ObjectMetadata> {
        self.object.iter().chain(self.veli.iter())
    }
}

/// A declarative catalog entry from `activities.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub display_name: String,
    pub source: String,
    pub activity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impacts: Option<Impacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, rename = "elecMJ", skip_serializing_if = "Option::is_none")]
    pub elec_mj: Option<f64>,
    #[serde(default, rename = "heatMJ", skip_serializing_if = "Option::is_none")]
    pub heat_mj: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waste: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_per_unit: Option<f64>,
    #[serde(default)]
    pub metadata: ScopedMetadata,
    /// Fields this version does not know about; kept in memory, never written out.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Activity {
    pub fn is_custom(&self) -> bool {
        self.source == CUSTOM_SOURCE
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn is_ingredient(&self) -> bool {
        self.has_category("ingredient")
    }

    pub fn is_packaging(&self) -> bool {
        self.has_category("packaging")
    }

    pub fn in_any_scope(&self, scopes: &[Scope]) -> bool {
        self.scopes.iter().any(|s| scopes.contains(s))
    }

    /// The identity used to detect duplicate catalog entries.
    pub fn lookup_key(&self) -> (String, String, Option<String>) {
        (
            self.source.clone(),
            self.activity_name.clone(),
            self.location.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_accept_toolkit_labels() {
        assert_eq!(Unit::parse("kilogram"), Some(Unit::Kg));
        assert_eq!(Unit::parse("ton kilometer"), Some(Unit::TonKm));
        assert_eq!(Unit::parse("unit"), Some(Unit::Item));
        assert_eq!(Unit::parse("hectare"), None);
        let unit: Unit = serde_json::from_str("\"m2\"").unwrap();
        assert_eq!(unit, Unit::SquareMeter);
        assert_eq!(serde_json::to_string(&unit).unwrap(), "\"m²\"");
    }

    #[test]
    fn activity_keeps_unknown_fields() {
        let activity: Activity = serde_json::from_str(
            r#"{
                "id": "3f2bd1a4-5f6f-4a0b-9c2d-3c1c2b8f9e01",
                "displayName": "Blé tendre",
                "source": "Agribalyse 3.1.1",
                "activityName": "wheat, at farm",
                "unit": "kg",
                "scopes": ["food"],
                "categories": ["ingredient"],
                "metadata": {"food": {"cropGroup": "BLE TENDRE", "scenario": "reference"}},
                "legacyAlias": "ble"
            }"#,
        )
        .unwrap();
        assert!(activity.is_ingredient());
        assert!(!activity.is_custom());
        assert_eq!(activity.metadata.declared_scopes(), vec![Scope::Food]);
        assert_eq!(activity.extra.get("legacyAlias"), Some(&serde_json::json!("ble")));
        let food = activity.metadata.food.unwrap();
        assert_eq!(food.scenario, Some(Scenario::Reference));
        assert!(!food.is_animal());
    }
}
