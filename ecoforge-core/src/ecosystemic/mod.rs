//! Non-LCA complements of food ingredients.
//!
//! Plant ingredients get their services from the crop group factor table scaled by
//! land occupation. Animal ingredients inherit the services of their feed, weighted
//! by the feed quantities, plus permanent pasture and livestock density terms.

pub mod factors;

use crate::catalog::Catalog;
use crate::report::RunReport;
use ecoforge_schemas::activity::{Activity, FoodMetadata, Scenario};
use ecoforge_schemas::ingredient::EcosystemicServices;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

pub use factors::{EcosystemicFactors, FeedTable, Service, UgbTable};

pub const HEDGES_THRESHOLD: f64 = 140.0;
pub const PLOT_SIZE_THRESHOLD: f64 = 8.0;
pub const CROP_DIVERSITY_THRESHOLD: f64 = 7.5;

/// Raw factor value to ecosystemic value. Negative raw values count as zero.
pub fn transform(service: Service, value: f64) -> f64 {
    let value = value.max(0.0);
    match service {
        Service::Hedges if value < HEDGES_THRESHOLD => value / HEDGES_THRESHOLD,
        Service::Hedges => 1.0,
        Service::PlotSize if value < PLOT_SIZE_THRESHOLD => 1.0 - value / PLOT_SIZE_THRESHOLD,
        Service::PlotSize => 0.0,
        Service::CropDiversity if value < CROP_DIVERSITY_THRESHOLD => 0.0,
        Service::CropDiversity => value - CROP_DIVERSITY_THRESHOLD,
        Service::LivestockDensity => value,
    }
}

/// Factor tables and the id of the permanent pasture feed item.
#[derive(Debug, Clone, Default)]
pub struct EcosystemicInputs {
    pub factors: EcosystemicFactors,
    pub feed: FeedTable,
    pub ugb: UgbTable,
    pub permanent_pasture_id: Option<String>,
}

/// Land occupation published for an ingredient: the catalog value when present,
/// clamped to zero, else the computed one.
pub fn resolve_land_occupation(
    activity: &Activity,
    computed: Option<f64>,
    report: &mut RunReport,
) -> Option<f64> {
    let declared = activity
        .metadata
        .food
        .as_ref()
        .and_then(|food| food.land_occupation);
    match declared {
        Some(value) if value < 0.0 => {
            report.integrity(
                &activity.id,
                format!("negative landOccupation {value}, using 0"),
            );
            Some(0.0)
        }
        Some(value) => Some(value),
        None => computed,
    }
}

/// Ids of `ingredients` plus every feed item their compositions reach, directly
/// or through other animals.
pub fn feed_closure(ingredients: &[&Activity], feed: &FeedTable) -> BTreeSet<String> {
    let mut reached = BTreeSet::new();
    let mut pending: Vec<String> = ingredients.iter().map(|a| a.id.clone()).collect();
    while let Some(id) = pending.pop() {
        if let Some(composition) = feed.composition(&id) {
            pending.extend(composition.keys().filter(|k| !reached.contains(*k)).cloned());
        }
        reached.insert(id);
    }
    reached
}

struct ServicesCalculator<'a> {
    catalog: &'a Catalog,
    inputs: &'a EcosystemicInputs,
    land_occupations: &'a HashMap<String, f64>,
    memo: HashMap<String, Option<EcosystemicServices>>,
    in_progress: HashSet<String>,
    report: RunReport,
}

impl<'a> ServicesCalculator<'a> {
    fn services_of(&mut self, id: &str) -> Option<EcosystemicServices> {
        if let Some(known) = self.memo.get(id) {
            return *known;
        }
        let Some(activity) = self.catalog.get(id) else {
            return None;
        };
        let Some(food) = activity.metadata.food.as_ref() else {
            debug!(activity = %id, "no food metadata, no ecosystemic services");
            self.memo.insert(id.to_string(), None);
            return None;
        };
        if !self.in_progress.insert(id.to_string()) {
            warn!(activity = %id, "feed composition loops back on itself");
            self.report
                .integrity(id, "feed composition loops back on itself, contribution ignored");
            return None;
        }
        let services = if food.is_animal() {
            Some(self.animal(activity, food))
        } else {
            self.plant(activity, food)
        };
        self.in_progress.remove(id);
        self.memo.insert(id.to_string(), services);
        services
    }

    fn factor(&mut self, id: &str, group: &str, service: Service, scenario: Scenario) -> f64 {
        match self.inputs.factors.get(group, service, scenario) {
            Some(value) => value,
            None => {
                self.report.integrity(
                    id,
                    format!(
                        "no {} factor for group '{group}' in scenario {scenario:?}, using 0",
                        service.as_str()
                    ),
                );
                0.0
            }
        }
    }

    fn plant(&mut self, activity: &Activity, food: &FoodMetadata) -> Option<EcosystemicServices> {
        let id = activity.id.as_str();
        let Some(group) = food.crop_group.as_deref() else {
            self.report
                .integrity(id, "plant ingredient without cropGroup, no ecosystemic services");
            return None;
        };
        let scenario = food.scenario.unwrap_or(Scenario::Reference);
        let land = match self.land_occupations.get(id) {
            Some(value) => *value,
            None => {
                self.report.integrity(id, "no land occupation available, using 0");
                0.0
            }
        };

        let hedges = self.factor(id, group, Service::Hedges, scenario);
        let plot_size = self.factor(id, group, Service::PlotSize, scenario);
        let crop_diversity = self.factor(id, group, Service::CropDiversity, scenario);
        Some(EcosystemicServices {
            hedges: transform(Service::Hedges, hedges) * land,
            plot_size: transform(Service::PlotSize, plot_size) * land,
            crop_diversity: transform(Service::CropDiversity, crop_diversity) * land,
            ..EcosystemicServices::default()
        })
    }

    fn animal(&mut self, activity: &Activity, food: &FoodMetadata) -> EcosystemicServices {
        let id = activity.id.as_str();
        let pasture_id = self.inputs.permanent_pasture_id.as_deref();
        let composition = match self.inputs.feed.composition(id) {
            Some(composition) => composition.clone(),
            None => {
                self.report.integrity(id, "animal ingredient without feed composition");
                BTreeMap::new()
            }
        };

        let mut services = EcosystemicServices::default();
        for (feed_id, quantity) in &composition {
            if !self.catalog.contains(feed_id) {
                warn!(animal = %id, feed = %feed_id, "feed item missing from the catalog");
                self.report
                    .integrity(id, format!("feed item '{feed_id}' is not in the catalog, counted as 0"));
                continue;
            }
            let Some(feed_services) = self.services_of(feed_id) else {
                self.report.integrity(
                    id,
                    format!("feed item '{feed_id}' has no ecosystemic services, counted as 0"),
                );
                continue;
            };
            services = services + feed_services * *quantity;
        }

        services.permanent_pasture = pasture_id
            .and_then(|pasture| composition.get(pasture))
            .copied()
            .unwrap_or(0.0);
        services.livestock_density = self.livestock_density(id, food);
        services
    }

    fn livestock_density(&mut self, id: &str, food: &FoodMetadata) -> f64 {
        let scenario = food.scenario.unwrap_or(Scenario::Reference);
        let Some(group) = food.animal_group1.as_deref().or(food.crop_group.as_deref()) else {
            self.report.integrity(id, "animal ingredient without animalGroup1, livestock density 0");
            return 0.0;
        };
        let factor = self.factor(id, group, Service::LivestockDensity, scenario);
        let ugb = match (food.animal_group2.as_deref(), food.animal_product.as_deref()) {
            (Some(group2), Some(product)) => self.inputs.ugb.get(group2, product),
            _ => None,
        };
        match ugb {
            Some(ugb) => transform(Service::LivestockDensity, factor) * ugb,
            None => {
                self.report
                    .integrity(id, "no livestock units per kg for this animal product, using 0");
                0.0
            }
        }
    }
}

/// Services of every ingredient in `ingredients`, keyed by activity id. Plants are
/// computed first so animal traversal reads them from the memo.
pub fn compute_services(
    ingredients: &[&Activity],
    catalog: &Catalog,
    inputs: &EcosystemicInputs,
    land_occupations: &HashMap<String, f64>,
) -> (BTreeMap<String, EcosystemicServices>, RunReport) {
    let mut calculator = ServicesCalculator {
        catalog,
        inputs,
        land_occupations,
        memo: HashMap::new(),
        in_progress: HashSet::new(),
        report: RunReport::new(),
    };

    let (animals, plants): (Vec<&Activity>, Vec<&Activity>) = ingredients
        .iter()
        .copied()
        .partition(|a| a.metadata.food.as_ref().is_some_and(FoodMetadata::is_animal));

    let mut services = BTreeMap::new();
    for activity in plants.into_iter().chain(animals) {
        if let Some(computed) = calculator.services_of(&activity.id) {
            services.insert(activity.id.clone(), computed);
        }
    }
    (services, calculator.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WHEAT: &str = "1b1a6c9e-30c4-4a3f-8e0e-1b3b1f9e0a01";
    const PASTURE: &str = "1b1a6c9e-30c4-4a3f-8e0e-1b3b1f9e0a02";
    const MILK: &str = "1b1a6c9e-30c4-4a3f-8e0e-1b3b1f9e0a03";
    const CHEESE: &str = "1b1a6c9e-30c4-4a3f-8e0e-1b3b1f9e0a04";

    fn ingredient(id: &str, name: &str, food: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "displayName": name,
            "source": "Agribalyse 3.1.1",
            "activityName": name,
            "scopes": ["food"],
            "categories": ["ingredient"],
            "metadata": {"food": food}
        })
    }

    fn catalog() -> Catalog {
        Catalog::from_json_str(
            &json!([
                ingredient(WHEAT, "Wheat", json!({"cropGroup": "BLE TENDRE"})),
                ingredient(PASTURE, "Pasture", json!({"cropGroup": "PRAIRIE"})),
                ingredient(MILK, "Milk", json!({
                    "animalGroup1": "BOVINS", "animalGroup2": "cow", "animalProduct": "milk"
                })),
                ingredient(CHEESE, "Cheese", json!({
                    "animalGroup1": "BOVINS", "animalGroup2": "cow", "animalProduct": "cheese"
                })),
            ])
            .to_string(),
        )
        .unwrap()
    }

    fn inputs() -> EcosystemicInputs {
        let factors = "group;hedges_reference;plotSize_reference;cropDiversity_reference;livestockDensity_reference\n\
                       BLE TENDRE;70;4;9;\n\
                       PRAIRIE;140;0;0;\n\
                       BOVINS;;;;2\n";
        EcosystemicInputs {
            factors: EcosystemicFactors::from_reader(factors.as_bytes(), "factors.csv").unwrap(),
            feed: FeedTable::from_iter([
                (
                    MILK.to_string(),
                    BTreeMap::from([(WHEAT.to_string(), 2.0), (PASTURE.to_string(), 1.0)]),
                ),
                (CHEESE.to_string(), BTreeMap::from([("unknown-feed".to_string(), 3.0)])),
            ]),
            ugb: UgbTable::from_reader(
                "animalGroup2;animalProduct;value\ncow;milk;0.5\n".as_bytes(),
                "ugb.csv",
            )
            .unwrap(),
            permanent_pasture_id: Some(PASTURE.to_string()),
        }
    }

    #[test]
    fn transforms_are_bounded_and_monotonic() {
        let samples = [-5.0, 0.0, 3.0, 7.5, 8.0, 100.0, 140.0, 500.0];
        let mut previous = [f64::MIN, f64::MAX, f64::MIN];
        for value in samples {
            let hedges = transform(Service::Hedges, value);
            let plot = transform(Service::PlotSize, value);
            let diversity = transform(Service::CropDiversity, value);
            assert!((0.0..=1.0).contains(&hedges) && hedges >= previous[0]);
            assert!((0.0..=1.0).contains(&plot) && plot <= previous[1]);
            assert!(diversity >= 0.0 && diversity >= previous[2]);
            previous = [hedges, plot, diversity];
        }
        assert_eq!(transform(Service::Hedges, 70.0), 0.5);
        assert_eq!(transform(Service::PlotSize, 4.0), 0.5);
        assert_eq!(transform(Service::CropDiversity, 9.0), 1.5);
    }

    #[test]
    fn feed_closure_follows_compositions() {
        let catalog = catalog();
        let inputs = inputs();
        let cheese = catalog.get(CHEESE).unwrap();
        let milk = catalog.get(MILK).unwrap();

        let reached = feed_closure(&[milk], &inputs.feed);
        let expected: BTreeSet<String> =
            [MILK, WHEAT, PASTURE].iter().map(|id| id.to_string()).collect();
        assert_eq!(reached, expected);

        let reached = feed_closure(&[cheese], &inputs.feed);
        assert!(reached.contains("unknown-feed"));
        assert!(!reached.contains(WHEAT));
    }

    #[test]
    fn animal_services_compose_feed_services() {
        let catalog = catalog();
        let inputs = inputs();
        let land = HashMap::from([(WHEAT.to_string(), 0.2), (PASTURE.to_string(), 5.0)]);
        let ingredients: Vec<&Activity> = catalog.activities().iter().collect();
        let (services, report) = compute_services(&ingredients, &catalog, &inputs, &land);

        let wheat = services[WHEAT];
        assert!((wheat.hedges - 0.1).abs() < 1e-12);
        assert!((wheat.plot_size - 0.1).abs() < 1e-12);
        assert!((wheat.crop_diversity - 0.3).abs() < 1e-12);

        let pasture = services[PASTURE];
        assert!((pasture.hedges - 5.0).abs() < 1e-12);
        assert!((pasture.plot_size - 5.0).abs() < 1e-12);

        let milk = services[MILK];
        assert!((milk.hedges - (2.0 * wheat.hedges + pasture.hedges)).abs() < 1e-12);
        assert!((milk.plot_size - (2.0 * wheat.plot_size + pasture.plot_size)).abs() < 1e-12);
        assert!((milk.crop_diversity - 2.0 * wheat.crop_diversity).abs() < 1e-12);
        assert_eq!(milk.permanent_pasture, 1.0);
        assert_eq!(milk.livestock_density, 1.0);

        let cheese = services[CHEESE];
        assert_eq!(cheese.hedges, 0.0);
        assert_eq!(cheese.livestock_density, 0.0);
        assert!(report
            .entries()
            .iter()
            .any(|e| e.activity_id == CHEESE && e.message.contains("unknown-feed")));
    }

    #[test]
    fn catalog_land_occupation_is_clamped() {
        let mut activity: Activity = serde_json::from_value(ingredient(
            WHEAT,
            "Wheat",
            json!({"cropGroup": "BLE TENDRE", "landOccupation": -3.0}),
        ))
        .unwrap();
        let mut report = RunReport::new();
        assert_eq!(resolve_land_occupation(&activity, Some(9.0), &mut report), Some(0.0));
        assert_eq!(report.entries().len(), 1);

        activity.metadata.food = Some(FoodMetadata::default());
        assert_eq!(resolve_land_occupation(&activity, Some(9.0), &mut report), Some(9.0));
    }
}
