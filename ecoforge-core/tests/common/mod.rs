#![allow(dead_code)]

use ecoforge_core::catalog::Catalog;
use ecoforge_core::ecosystemic::{EcosystemicFactors, EcosystemicInputs, FeedTable, UgbTable};
use ecoforge_core::gateway::MethodRegistry;
use ecoforge_core::lci::{LciDatabase, LciStore};
use ecoforge_core::normalization::ImpactDefinitions;
use ecoforge_core::pipeline::{Pipeline, PipelineBuilder};
use ecoforge_schemas::lci::Dataset;
use ecoforge_schemas::method::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const DATABASE: &str = "Agribalyse 3.1.1";
pub const METHOD: &str = "EF 3.1";
pub const LAND_METHOD: &str = "Land occupation";

pub const WHEAT: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e01";
pub const PASTURE: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e02";
pub const MILK: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e03";
pub const WHEAT_AT_FARM: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e04";
pub const COMPOST: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e05";
pub const COMPOST_POSITIVE: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e06";
pub const RILLETTES: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e07";
pub const CUSTOM: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e08";
pub const COTTON: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e09";
pub const OAK: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e0a";
pub const OAK_FSC: &str = "0b6c1a57-3f1e-4c9a-9d3e-5c2f7a1b8e0b";

fn dataset(value: Value) -> Dataset {
    serde_json::from_value(value).unwrap()
}

fn co2(amount: f64) -> Value {
    json!({"type": "biosphere", "flow": "Carbon dioxide, fossil", "compartment": "air", "amount": amount})
}

fn land(amount: f64) -> Value {
    json!({"type": "biosphere", "flow": "Occupation, arable", "amount": amount})
}

pub fn database() -> LciDatabase {
    let compost_exchanges = json!([
        {"type": "biosphere", "flow": "Methane", "compartment": "air", "amount": 0.01},
        co2(0.02)
    ]);
    LciDatabase::new(
        DATABASE,
        vec![
            dataset(json!({
                "code": "wheat", "name": "Soft wheat grain, conventional, at farm gate",
                "location": "FR", "unit": "kilogram", "production_amount": 1.0,
                "exchanges": [
                    co2(0.35), land(1.2),
                    {"type": "biosphere", "flow": "Zinc", "compartment": "water", "amount": 0.001},
                    {"type": "biosphere", "flow": "Sulfur dioxide", "compartment": "air", "amount": 0.002}
                ]
            })),
            dataset(json!({
                "code": "pasture", "name": "Grass, permanent pasture, at farm",
                "location": "FR", "unit": "kilogram", "production_amount": 1.0,
                "exchanges": [co2(0.05), land(2.0)]
            })),
            dataset(json!({
                "code": "milk", "name": "Cow milk, conventional, at farm gate",
                "location": "FR", "unit": "kilogram", "production_amount": 1.0,
                "exchanges": [
                    {"type": "technosphere", "input": "wheat", "amount": 2.0},
                    {"type": "technosphere", "input": "pasture", "amount": 1.0},
                    co2(0.3),
                    {"type": "biosphere", "flow": "Methane", "compartment": "air", "amount": 0.02}
                ]
            })),
            dataset(json!({
                "code": "wheat-farm-1", "name": "wheat, at farm", "unit": "kilogram",
                "production_amount": 1.0, "exchanges": [co2(0.4)]
            })),
            dataset(json!({
                "code": "wheat-farm-2", "name": "wheat, at farm", "unit": "kilogram",
                "production_amount": 1.0, "exchanges": [co2(0.45)]
            })),
            dataset(json!({
                "code": "compost", "name": "Treatment of biowaste, composting",
                "unit": "kilogram", "production_amount": -1.0, "exchanges": compost_exchanges.clone()
            })),
            dataset(json!({
                "code": "compost-positive", "name": "Treatment of biowaste, composting, positive",
                "unit": "kilogram", "production_amount": 1.0, "exchanges": compost_exchanges
            })),
            dataset(json!({
                "code": "rillettes", "name": "Rillettes 220g | Packaging System",
                "location": "FR", "unit": "unit", "production_amount": 0.22,
                "exchanges": [co2(0.11)],
                "parameters": {"PACKAGING_SYSTEM_G": 24.0}
            })),
            dataset(json!({
                "code": "power", "name": "Electricity, medium voltage", "location": "FR",
                "unit": "kilowatt hour", "production_amount": 1.0, "exchanges": [co2(0.06)]
            })),
            dataset(json!({
                "code": "cotton", "name": "Fibre, cotton, conventional", "location": "CN",
                "unit": "kilogram", "production_amount": 1.0,
                "exchanges": [{"type": "technosphere", "input": "power", "amount": 0.5}, co2(1.8), land(3.0)]
            })),
            dataset(json!({
                "code": "oak", "name": "Sawnwood, board, hardwood, dried", "location": "GLO",
                "unit": "cubic meter", "production_amount": 1.0, "exchanges": [co2(42.0)],
                "comment": "Kiln dried, planed"
            })),
        ],
    )
    .unwrap()
}

fn indicator(code: &str, name: &str, factors: Value) -> Value {
    json!({"code": code, "name": name, "unit": "", "factors": factors})
}

pub fn methods() -> MethodRegistry {
    let ef: Method = serde_json::from_value(json!({
        "name": METHOD,
        "indicators": [
            indicator("acd", "Acidification", json!([{"flow": "Sulfur dioxide", "compartment": "air", "value": 1.3}])),
            indicator("cch", "Climate change", json!([
                {"flow": "Carbon dioxide, fossil", "compartment": "air", "value": 1.0},
                {"flow": "Methane", "value": 29.7}
            ])),
            indicator("ldu", "Land use", json!([{"flow": "Occupation, arable", "value": 80.0}])),
            indicator("etf1", "Ecotoxicity, freshwater - part 1", json!([{"flow": "Zinc", "compartment": "water", "value": 1000.0}])),
            indicator("etf2", "Ecotoxicity, freshwater - part 2", json!([{"flow": "Zinc", "compartment": "water", "value": 200.0}])),
            indicator("etf-o1", "Ecotoxicity, freshwater - organics - p.1", json!([{"flow": "Zinc", "compartment": "water", "value": 10.0}])),
            indicator("etf-o2", "Ecotoxicity, freshwater - organics - p.2", json!([]))
        ]
    }))
    .unwrap();
    let land: Method = serde_json::from_value(json!({
        "name": LAND_METHOD,
        "indicators": [indicator("lop", "Land occupation", json!([{"flow": "Occupation, arable", "value": 1.0}]))]
    }))
    .unwrap();
    MethodRegistry::new().with_method(ef).with_method(land)
}

pub fn definitions() -> ImpactDefinitions {
    ImpactDefinitions::from_raw(
        serde_json::from_value(json!({
            "acd": {"label_en": "Acidification",
                    "pef": {"normalization": 55.6, "weighting": 0.062},
                    "ecoscore": {"normalization": 55.6, "weighting": 0.049}},
            "cch": {"label_en": "Climate change",
                    "pef": {"normalization": 7553.0, "weighting": 0.2106},
                    "ecoscore": {"normalization": 7553.0, "weighting": 0.2106}},
            "ldu": {"label_en": "Land use",
                    "pef": {"normalization": 819498.0, "weighting": 0.0794},
                    "ecoscore": null},
            "etf": {"label_en": "Ecotoxicity, freshwater",
                    "pef": {"normalization": 56700.0, "weighting": 0.0192},
                    "ecoscore": null},
            "etf-c": {"label_en": "Ecotoxicity, freshwater, corrected",
                      "pef": null,
                      "ecoscore": {"normalization": 98100.0, "weighting": 0.1},
                      "correction": [{"sub-impact": "etf-o", "weighting": 1.0},
                                     {"sub-impact": "etf-i", "weighting": 1.0}]}
        }))
        .unwrap(),
    )
    .unwrap()
}

fn full_impacts(overrides: Value) -> Value {
    let mut impacts = json!({
        "acd": 0.0, "cch": 0.0, "etf": 0.0, "etf-c": 0.0, "fru": 0.0, "fwe": 0.0, "htc": 0.0,
        "htc-c": 0.0, "htn": 0.0, "htn-c": 0.0, "ior": 0.0, "ldu": 0.0, "mru": 0.0, "ozd": 0.0,
        "pco": 0.0, "pma": 0.0, "swe": 0.0, "tre": 0.0, "wtu": 0.0
    });
    for (key, value) in overrides.as_object().unwrap() {
        impacts[key] = value.clone();
    }
    impacts
}

fn activity(id: &str, name: &str, scopes: Value, categories: Value, extra: Value) -> Value {
    let mut value = json!({
        "id": id,
        "displayName": name,
        "source": DATABASE,
        "activityName": name,
        "scopes": scopes,
        "categories": categories
    });
    for (key, v) in extra.as_object().unwrap() {
        value[key] = v.clone();
    }
    value
}

pub fn catalog_json() -> Value {
    json!([
        activity(WHEAT, "Soft wheat grain, conventional, at farm gate", json!(["food"]), json!(["ingredient"]),
            json!({"metadata": {"food": {"cropGroup": "BLE TENDRE", "landOccupation": 0.2, "alias": "wheat"}}})),
        activity(PASTURE, "Grass, permanent pasture, at farm", json!(["food"]), json!(["ingredient"]),
            json!({"metadata": {"food": {"cropGroup": "PRAIRIE", "visible": false}}})),
        activity(MILK, "Cow milk, conventional, at farm gate", json!(["food"]), json!(["ingredient"]),
            json!({"metadata": {"food": {
                "animalGroup1": "BOVINS", "animalGroup2": "cow", "animalProduct": "milk",
                "transportCooling": "always", "ingredientDensity": 1.03
            }}})),
        activity(WHEAT_AT_FARM, "wheat, at farm", json!(["food"]), json!(["ingredient"]),
            json!({"metadata": {"food": {"cropGroup": "BLE TENDRE"}}})),
        activity(COMPOST, "Treatment of biowaste, composting", json!(["food"]), json!(["waste"]), json!({})),
        activity(COMPOST_POSITIVE, "Treatment of biowaste, composting, positive", json!(["food"]), json!(["waste"]), json!({})),
        activity(RILLETTES, "Rillettes 220g | Packaging System", json!(["food"]), json!(["packaging"]),
            json!({"unit": "item"})),
        json!({
            "id": CUSTOM,
            "displayName": "Mechanical recycling, custom",
            "source": "Custom",
            "activityName": "",
            "scopes": ["textile"],
            "categories": ["transformation"],
            "unit": "kg",
            "impacts": full_impacts(json!({"cch": 1.5, "ldu": 0.2, "acd": 0.004, "etf-c": 12.0}))
        }),
        activity(COTTON, "Fibre, cotton, conventional", json!(["textile"]), json!(["material"]),
            json!({"metadata": {"textile": {"materialName": "Cotton", "geographicOrigin": "Asie", "defaultCountry": "CN"}},
                   "elecMJ": 0.5})),
        activity(OAK, "Sawnwood, board, hardwood, dried", json!(["object"]), json!(["material"]),
            json!({"metadata": {"object": {
                "variants": [{"id": OAK_FSC, "displayName": "Oak board, FSC", "forestManagement": "sustainable"}],
                "complements": {"forest": -5.0}
            }}}))
    ])
}

pub fn catalog() -> Catalog {
    Catalog::from_json_str(&catalog_json().to_string()).unwrap()
}

pub fn ecosystemic() -> EcosystemicInputs {
    let factors = "group;hedges_reference;plotSize_reference;cropDiversity_reference;livestockDensity_reference\n\
                   BLE TENDRE;70;0;9;\n\
                   PRAIRIE;0;8;0;\n\
                   BOVINS;;;;2\n";
    EcosystemicInputs {
        factors: EcosystemicFactors::from_reader(factors.as_bytes(), "ecosystemic_factors.csv").unwrap(),
        feed: FeedTable::from_iter([(
            MILK.to_string(),
            BTreeMap::from([(WHEAT.to_string(), 2.0), (PASTURE.to_string(), 1.0)]),
        )]),
        ugb: UgbTable::from_reader("animalGroup2;animalProduct;value\ncow;milk;0.5\n".as_bytes(), "ugb.csv")
            .unwrap(),
        permanent_pasture_id: Some(PASTURE.to_string()),
    }
}

pub fn builder() -> PipelineBuilder {
    Pipeline::builder()
        .with_catalog(catalog())
        .with_definitions(definitions())
        .with_store(LciStore::new().with_database(database()))
        .with_methods(methods())
        .with_method(METHOD)
        .with_land_occupation_method(Some(LAND_METHOD.to_string()))
        .with_ecosystemic_inputs(ecosystemic())
        .with_forest_complements(BTreeMap::from([("sustainable".to_string(), -8.0)]))
        .with_cpu_count(Some(2))
}

pub fn pipeline() -> Pipeline {
    builder().build().unwrap()
}
