use crate::activity::{Scenario, TransportCooling};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// Non-LCA complements attached to agricultural ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemicServices {
    pub hedges: f64,
    pub plot_size: f64,
    pub crop_diversity: f64,
    pub livestock_density: f64,
    pub permanent_pasture: f64,
}

impl Add for EcosystemicServices {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            hedges: self.hedges + rhs.hedges,
            plot_size: self.plot_size + rhs.plot_size,
            crop_diversity: self.crop_diversity + rhs.crop_diversity,
            livestock_density: self.livestock_density + rhs.livestock_density,
            permanent_pasture: self.permanent_pasture + rhs.permanent_pasture,
        }
    }
}

impl Mul<f64> for EcosystemicServices {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self {
            hedges: self.hedges * factor,
            plot_size: self.plot_size * factor,
            crop_diversity: self.crop_diversity * factor,
            livestock_density: self.livestock_density * factor,
            permanent_pasture: self.permanent_pasture * factor,
        }
    }
}

/// The food-scope view of an ingredient activity, written to `ingredients.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub alias: String,
    pub name: String,
    pub process_id: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_origin: Option<String>,
    pub density: f64,
    pub raw_to_cooked_ratio: f64,
    pub inedible_part: f64,
    pub transport_cooling: TransportCooling,
    pub visible: bool,
    pub land_occupation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecosystemic_services: Option<EcosystemicServices>,
}
