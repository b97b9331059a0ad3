use crate::aggregate;
use crate::error::{ComputationError, OracleUnavailable};
use crate::gateway::Gateway;
use crate::lci::{Binding, LciStore};
use crate::normalization::ImpactDefinitions;
use ecoforge_schemas::activity::{Activity, Unit};
use ecoforge_schemas::impacts::Impacts;
use ecoforge_schemas::lci::Dataset;
use tracing::{debug, warn};

/// Backend label of impacts given inline in the catalog.
pub const INLINE_BACKEND: &str = "inline";

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedImpacts {
    pub impacts: Impacts,
    pub backend: &'static str,
    pub fallbacks: Vec<OracleUnavailable>,
}

/// Computes the impact vector of one catalog activity.
pub struct ImpactEngine<'a> {
    store: &'a LciStore,
    definitions: &'a ImpactDefinitions,
    gateway: Gateway<'a>,
    method: String,
    land_occupation_method: Option<String>,
}

impl<'a> ImpactEngine<'a> {
    pub fn new(
        store: &'a LciStore,
        definitions: &'a ImpactDefinitions,
        gateway: Gateway<'a>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            store,
            definitions,
            gateway,
            method: method.into(),
            land_occupation_method: None,
        }
    }

    pub fn with_land_occupation_method(mut self, method: Option<String>) -> Self {
        self.land_occupation_method = method;
        self
    }

    /// Unit-`item` packaging is computed for one physical item, i.e. its production
    /// amount; everything else for one unit of product or of treated waste.
    pub fn demand(activity: &Activity, dataset: &Dataset) -> f64 {
        let unit = activity.unit.or_else(|| Unit::parse(&dataset.unit));
        if activity.is_packaging() && unit == Some(Unit::Item) {
            dataset.production_amount
        } else {
            dataset.production_sign()
        }
    }

    pub fn compute(
        &mut self,
        activity: &Activity,
        binding: Option<&Binding>,
    ) -> Result<ComputedImpacts, ComputationError> {
        if let Some(inline) = &activity.impacts {
            let impacts = aggregate::finalize(inline.to_raw(), self.definitions);
            ensure_finite(&activity.id, &impacts)?;
            return Ok(ComputedImpacts {
                impacts,
                backend: INLINE_BACKEND,
                fallbacks: Vec::new(),
            });
        }

        let binding = binding.ok_or_else(|| ComputationError::Unbound(activity.id.clone()))?;
        let dataset = self.bound_dataset(binding)?;
        if Unit::parse(&dataset.unit).is_none() {
            warn!(
                dataset = %dataset.name,
                unit = %dataset.unit,
                "dataset unit outside the supported set, kept as null"
            );
        }

        let demand = Self::demand(activity, dataset);
        debug!(activity = %activity.id, dataset = %dataset.name, demand, "computing impacts");
        let result = self
            .gateway
            .impacts(&binding.database, dataset, &self.method, Some(demand))?;

        let impacts = aggregate::finalize(result.impacts, self.definitions);
        ensure_finite(&activity.id, &impacts)?;
        Ok(ComputedImpacts {
            impacts,
            backend: result.backend,
            fallbacks: result.fallbacks,
        })
    }

    /// Land occupation per unit of the bound dataset under the land occupation method,
    /// the sum of its indicators. `None` when no such method is configured.
    pub fn land_occupation(&mut self, binding: &Binding) -> Result<Option<f64>, ComputationError> {
        let Some(method) = self.land_occupation_method.clone() else {
            return Ok(None);
        };
        let dataset = self.bound_dataset(binding)?;
        let result = self.gateway.impacts(&binding.database, dataset, &method, None)?;
        Ok(Some(result.impacts.values().sum()))
    }

    fn bound_dataset(&self, binding: &Binding) -> Result<&'a Dataset, ComputationError> {
        binding
            .dataset(self.store)
            .ok_or_else(|| ComputationError::UnknownDataset {
                database: binding.database.clone(),
                code: binding.code.clone(),
            })
    }
}

fn ensure_finite(id: &str, impacts: &Impacts) -> Result<(), ComputationError> {
    match impacts.iter().find(|(_, v)| !v.is_finite()) {
        Some((trigram, _)) => Err(ComputationError::NonFinite {
            id: id.to_string(),
            trigram: trigram.code().to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(categories: &[&str], unit: Option<&str>) -> Activity {
        serde_json::from_value(json!({
            "id": "6a0f4c1e-8b2d-4e3f-9a1b-2c3d4e5f6a7b",
            "displayName": "Rillettes 220g",
            "source": "Agribalyse 3.1.1",
            "activityName": "Rillettes 220g | Packaging System",
            "unit": unit,
            "scopes": ["food"],
            "categories": categories
        }))
        .unwrap()
    }

    fn dataset(unit: &str, production_amount: f64) -> Dataset {
        serde_json::from_value(json!({
            "code": "p", "name": "Rillettes 220g | Packaging System",
            "unit": unit, "production_amount": production_amount
        }))
        .unwrap()
    }

    #[test]
    fn packaging_items_use_production_amount() {
        let packaging = activity(&["packaging"], Some("item"));
        assert_eq!(ImpactEngine::demand(&packaging, &dataset("unit", 0.22)), 0.22);
        let per_kg = activity(&["packaging"], Some("kg"));
        assert_eq!(ImpactEngine::demand(&per_kg, &dataset("kilogram", 0.22)), 1.0);
    }

    #[test]
    fn waste_treatment_demand_is_negative() {
        let waste = activity(&["waste"], None);
        assert_eq!(ImpactEngine::demand(&waste, &dataset("kilogram", -1.0)), -1.0);
    }

    #[test]
    fn non_finite_impacts_are_rejected() {
        let mut impacts = Impacts::zeroed();
        impacts.set(ecoforge_schemas::impacts::Trigram::Cch, f64::NAN);
        assert!(matches!(
            ensure_finite("x", &impacts),
            Err(ComputationError::NonFinite { trigram, .. }) if trigram == "cch"
        ));
    }
}
