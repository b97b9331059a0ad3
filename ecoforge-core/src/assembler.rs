use crate::error::ComputationError;
use ecoforge_schemas::activity::{Activity, Scope, Unit};
use ecoforge_schemas::impacts::Impacts;
use ecoforge_schemas::lci::Dataset;
use ecoforge_schemas::process::{Process, ProcessMetadata};

pub const PACKAGING_MASS_G: &str = "PACKAGING_SYSTEM_G";
pub const PACKAGING_MASS_KG: &str = "PACKAGING_SYSTEM_KG";

/// Joins a catalog activity, its bound dataset and its impacts into a `Process`.
/// Catalog fields win over dataset fields.
pub fn assemble(
    activity: &Activity,
    dataset: Option<&Dataset>,
    impacts: Impacts,
) -> Result<Process, ComputationError> {
    let unit = activity
        .unit
        .or_else(|| dataset.and_then(|d| Unit::parse(&d.unit)));
    let comment = activity
        .comment
        .clone()
        .or_else(|| dataset.and_then(|d| d.comment.clone()))
        .unwrap_or_default();

    Ok(Process {
        id: activity.id.clone(),
        activity_name: activity.activity_name.clone(),
        display_name: activity.display_name.clone(),
        source: activity.source.clone(),
        source_id: dataset.map(|d| d.name.clone()),
        categories: activity.categories.clone(),
        scopes: activity.scopes.clone(),
        unit,
        location: activity
            .location
            .clone()
            .or_else(|| dataset.and_then(|d| d.location.clone())),
        comment,
        elec_mj: activity.elec_mj.unwrap_or(0.0),
        heat_mj: activity.heat_mj.unwrap_or(0.0),
        waste: activity.waste.unwrap_or(0.0),
        mass_per_unit: mass_per_unit(activity, dataset, unit)?,
        impacts,
        metadata: object_metadata(activity),
    })
}

/// Mass of one packaging item in kg. Required for unit-`item` packaging only.
fn mass_per_unit(
    activity: &Activity,
    dataset: Option<&Dataset>,
    unit: Option<Unit>,
) -> Result<Option<f64>, ComputationError> {
    if activity.mass_per_unit.is_some() {
        return Ok(activity.mass_per_unit);
    }
    if !activity.is_packaging() || unit != Some(Unit::Item) {
        return Ok(None);
    }
    let grams = dataset.and_then(|d| d.parameter(PACKAGING_MASS_G));
    let kilograms = dataset.and_then(|d| d.parameter(PACKAGING_MASS_KG));
    match (grams, kilograms) {
        (Some(g), _) => Ok(Some(g / 1000.0)),
        (None, Some(kg)) => Ok(Some(kg)),
        (None, None) => Err(ComputationError::MissingMassPerUnit(activity.id.clone())),
    }
}

fn object_metadata(activity: &Activity) -> Option<ProcessMetadata> {
    if !activity.in_any_scope(&[Scope::Object, Scope::Veli]) {
        return None;
    }
    let complements = activity
        .metadata
        .object_like()
        .filter_map(|object| object.complements.clone())
        .flatten()
        .collect();
    Some(ProcessMetadata { complements })
}
