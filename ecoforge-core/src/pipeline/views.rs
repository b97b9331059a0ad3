//! Domain views derived from catalog activities: ingredients, materials and
//! object variants.

use crate::report::RunReport;
use ecoforge_schemas::activity::{Activity, TransportCooling};
use ecoforge_schemas::ingredient::{EcosystemicServices, Ingredient};
use ecoforge_schemas::material::Material;
use ecoforge_schemas::process::{GenericComplements, GenericProcess};
use std::collections::BTreeMap;

/// `None` for activities without food metadata.
pub fn ingredient(
    activity: &Activity,
    land_occupation: Option<f64>,
    services: Option<EcosystemicServices>,
) -> Option<Ingredient> {
    let food = activity.metadata.food.as_ref()?;
    Some(Ingredient {
        id: activity.id.clone(),
        alias: food.alias.clone().unwrap_or_else(|| activity.id.clone()),
        name: activity.display_name.clone(),
        process_id: activity.id.clone(),
        categories: activity.categories.clone(),
        crop_group: food.crop_group.clone(),
        scenario: food.scenario,
        default_origin: food.default_origin.clone(),
        density: food.ingredient_density.unwrap_or(1.0),
        raw_to_cooked_ratio: food.raw_to_cooked_ratio.unwrap_or(1.0),
        inedible_part: food.inedible_part.unwrap_or(0.0),
        transport_cooling: food.transport_cooling.unwrap_or(TransportCooling::None),
        visible: food.visible.unwrap_or(true),
        land_occupation: land_occupation.unwrap_or(0.0),
        ecosystemic_services: services,
    })
}

/// `None` for activities without textile metadata.
pub fn material(activity: &Activity) -> Option<Material> {
    let textile = activity.metadata.textile.as_ref()?;
    Some(Material {
        id: activity.id.clone(),
        alias: textile.alias.clone().unwrap_or_else(|| activity.id.clone()),
        name: activity.display_name.clone(),
        short_name: textile
            .material_name
            .clone()
            .unwrap_or_else(|| activity.display_name.clone()),
        process_id: activity.id.clone(),
        origin: textile.origin.clone(),
        geographic_origin: textile.geographic_origin.clone(),
        default_country: textile.default_country.clone(),
        primary: textile.primary.unwrap_or(true),
        recycled_from: textile.recycled_from.clone(),
        cff: textile.cff.clone(),
    })
}

/// One generic process per object variant, with the forest complement of its
/// forest management mode when it has one.
pub fn generic_processes(
    activity: &Activity,
    forest_complements: &BTreeMap<String, f64>,
    report: &mut RunReport,
) -> Vec<GenericProcess> {
    activity
        .metadata
        .object_like()
        .flat_map(|object| object.variants.iter())
        .map(|variant| {
            let forest = variant.forest_management.as_deref().and_then(|mode| {
                let complement = forest_complements.get(mode).copied();
                if complement.is_none() {
                    report.integrity(
                        &variant.id,
                        format!("no forest complement for management mode '{mode}'"),
                    );
                }
                complement
            });
            GenericProcess {
                id: variant.id.clone(),
                display_name: variant.display_name.clone(),
                process_id: activity.id.clone(),
                complements: GenericComplements { forest },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(metadata: serde_json::Value, scopes: &[&str]) -> Activity {
        serde_json::from_value(json!({
            "id": "7e1f0b9c-2d3a-4c5b-8e6f-7a8b9c0d1e2f",
            "displayName": "Organic wheat",
            "source": "Agribalyse 3.1.1",
            "activityName": "Soft wheat grain, organic, at farm gate",
            "scopes": scopes,
            "categories": ["ingredient"],
            "metadata": metadata
        }))
        .unwrap()
    }

    #[test]
    fn ingredient_defaults() {
        let wheat = activity(json!({"food": {"cropGroup": "BLE TENDRE", "alias": "wheat-organic"}}), &["food"]);
        let view = ingredient(&wheat, Some(1.7), None).unwrap();
        assert_eq!(view.alias, "wheat-organic");
        assert_eq!(view.process_id, wheat.id);
        assert_eq!(view.density, 1.0);
        assert_eq!(view.raw_to_cooked_ratio, 1.0);
        assert_eq!(view.transport_cooling, TransportCooling::None);
        assert!(view.visible);
        assert_eq!(view.land_occupation, 1.7);
        assert!(material(&wheat).is_none());
    }

    #[test]
    fn material_short_name_falls_back_to_display_name() {
        let cotton = activity(json!({"textile": {"geographicOrigin": "Asie"}}), &["textile"]);
        let view = material(&cotton).unwrap();
        assert_eq!(view.short_name, "Organic wheat");
        assert_eq!(view.alias, cotton.id);
        assert!(view.primary);
    }

    #[test]
    fn variants_get_forest_complements() {
        let board = activity(
            json!({"object": {"variants": [
                {"id": "v-1", "displayName": "Oak board, FSC", "forestManagement": "sustainable"},
                {"id": "v-2", "displayName": "Oak board", "forestManagement": "clear-cut"},
                {"id": "v-3", "displayName": "Oak board, reused"}
            ]}}),
            &["object"],
        );
        let complements = BTreeMap::from([("sustainable".to_string(), -8.0)]);
        let mut report = RunReport::new();
        let generic = generic_processes(&board, &complements, &mut report);
        assert_eq!(generic.len(), 3);
        assert_eq!(generic[0].complements.forest, Some(-8.0));
        assert_eq!(generic[1].complements.forest, None);
        assert_eq!(generic[2].complements.forest, None);
        assert_eq!(generic[2].process_id, board.id);
        assert_eq!(report.entries().len(), 1);
    }
}
