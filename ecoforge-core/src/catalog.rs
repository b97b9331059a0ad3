use crate::error::{CatalogError, CatalogIssue, EcoforgeError};
use ecoforge_schemas::activity::{Activity, Scope};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::{Uuid, Version};

/// The validated, ordered activity catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    activities: Vec<Activity>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, EcoforgeError> {
        let content = fs::read_to_string(path)
            .map_err(|e| EcoforgeError::FileIO(path.display().to_string(), e))?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            activities = catalog.len(),
            "activity catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let activities: Vec<Activity> = serde_json::from_str(content).map_err(|e| CatalogError {
            issues: vec![CatalogIssue::Malformed(e.to_string())],
        })?;
        Self::from_activities(activities)
    }

    /// Validates the activities and builds the catalog, reporting every offender at once.
    pub fn from_activities(activities: Vec<Activity>) -> Result<Self, CatalogError> {
        let issues = validate(&activities);
        if !issues.is_empty() {
            return Err(CatalogError { issues });
        }
        let index = activities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Ok(Self { activities, index })
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.index.get(id).map(|&i| &self.activities[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activities whose scopes intersect `scopes`, in catalog order. An empty filter
    /// keeps everything.
    pub fn filter(&self, scopes: &[Scope]) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| scopes.is_empty() || a.in_any_scope(scopes))
            .collect()
    }
}

pub fn validate(activities: &[Activity]) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    let mut by_key: BTreeMap<(String, String, Option<String>), Vec<String>> = BTreeMap::new();

    for activity in activities {
        let is_v4 = Uuid::parse_str(&activity.id)
            .is_ok_and(|uuid| uuid.get_version() == Some(Version::Random));
        if !is_v4 {
            issues.push(CatalogIssue::InvalidId(activity.id.clone()));
        }

        let count = seen_ids.entry(activity.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            issues.push(CatalogIssue::DuplicateId(activity.id.clone()));
        }

        if activity.display_name.trim().is_empty() {
            issues.push(CatalogIssue::MissingField {
                id: activity.id.clone(),
                field: "displayName",
            });
        }

        if activity.scopes.is_empty() {
            issues.push(CatalogIssue::EmptyScopes(activity.id.clone()));
        }

        let stray: Vec<Scope> = activity
            .metadata
            .declared_scopes()
            .into_iter()
            .filter(|s| !activity.scopes.contains(s))
            .collect();
        if !stray.is_empty() {
            issues.push(CatalogIssue::MetadataOutsideScopes {
                id: activity.id.clone(),
                scopes: stray,
            });
        }

        if activity.is_custom() {
            match &activity.impacts {
                None => issues.push(CatalogIssue::MissingField {
                    id: activity.id.clone(),
                    field: "impacts",
                }),
                Some(impacts) => {
                    let missing = impacts.missing_indicators();
                    if !missing.is_empty() {
                        issues.push(CatalogIssue::IncompleteCustomImpacts {
                            id: activity.id.clone(),
                            missing: missing.iter().map(|t| t.code().to_string()).collect(),
                        });
                    }
                }
            }
        } else {
            if activity.activity_name.trim().is_empty() {
                issues.push(CatalogIssue::MissingField {
                    id: activity.id.clone(),
                    field: "activityName",
                });
            }
            by_key
                .entry(activity.lookup_key())
                .or_default()
                .push(activity.id.clone());
        }
    }

    for ((database, activity_name, location), ids) in by_key {
        if ids.len() > 1 {
            issues.push(CatalogIssue::DuplicateActivity {
                database,
                activity_name,
                location,
                ids,
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "displayName": name,
            "source": "Agribalyse 3.1.1",
            "activityName": name,
            "unit": "kg",
            "scopes": ["food"],
            "categories": ["ingredient"]
        })
    }

    fn parse(entries: Vec<serde_json::Value>) -> Result<Catalog, CatalogError> {
        Catalog::from_json_str(&serde_json::Value::Array(entries).to_string())
    }

    #[test]
    fn loads_valid_catalog_in_order() {
        let catalog = parse(vec![
            entry("8f2c8a4e-2f4b-4d7a-9a0e-7b1d0c9e6a11", "wheat, at farm"),
            entry("1c7f3e52-0b8d-4c6e-8a3f-5d2e9b4a7c20", "milk, at farm"),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.activities()[0].activity_name, "wheat, at farm");
        assert!(catalog.get("1c7f3e52-0b8d-4c6e-8a3f-5d2e9b4a7c20").is_some());
    }

    #[test]
    fn reports_every_offender() {
        let mut bad_scope = entry("4b1e6f0c-9d2a-4e3b-8c7d-6a5f4e3d2c10", "rice");
        bad_scope["metadata"] = json!({"textile": {"materialName": "rice"}});
        let err = parse(vec![
            entry("not-a-uuid", "wheat, at farm"),
            entry("8f2c8a4e-2f4b-4d7a-9a0e-7b1d0c9e6a11", "milk, at farm"),
            entry("8f2c8a4e-2f4b-4d7a-9a0e-7b1d0c9e6a11", "milk, at farm"),
            bad_scope,
        ])
        .unwrap_err();

        assert!(err.issues.contains(&CatalogIssue::InvalidId("not-a-uuid".to_string())));
        assert!(err.issues.contains(&CatalogIssue::DuplicateId(
            "8f2c8a4e-2f4b-4d7a-9a0e-7b1d0c9e6a11".to_string()
        )));
        assert!(err.issues.iter().any(|i| matches!(
            i,
            CatalogIssue::DuplicateActivity { activity_name, ids, .. }
                if activity_name == "milk, at farm" && ids.len() == 2
        )));
        assert!(err.issues.iter().any(|i| matches!(
            i,
            CatalogIssue::MetadataOutsideScopes { scopes, .. } if scopes == &vec![Scope::Textile]
        )));
    }

    #[test]
    fn ids_must_be_version_4() {
        let time_based = "c232ab00-9414-11ec-b3c8-9e6bdeced846";
        let err = parse(vec![entry(time_based, "wheat, at farm")]).unwrap_err();
        assert_eq!(err.issues, vec![CatalogIssue::InvalidId(time_based.to_string())]);
    }

    #[test]
    fn same_name_with_distinct_locations_is_allowed() {
        let mut fr = entry("8f2c8a4e-2f4b-4d7a-9a0e-7b1d0c9e6a11", "wheat, at farm");
        fr["location"] = json!("FR");
        let mut de = entry("1c7f3e52-0b8d-4c6e-8a3f-5d2e9b4a7c20", "wheat, at farm");
        de["location"] = json!("DE");
        assert!(parse(vec![fr, de]).is_ok());
    }

    #[test]
    fn custom_entries_need_complete_impacts() {
        let custom = json!({
            "id": "2d4e6f80-1a3b-4c5d-8e7f-9a0b1c2d3e4f",
            "displayName": "Custom electricity",
            "source": "Custom",
            "activityName": "",
            "unit": "kWh",
            "scopes": ["textile"],
            "impacts": {"cch": 1.5}
        });
        let err = parse(vec![custom]).unwrap_err();
        assert!(matches!(
            &err.issues[0],
            CatalogIssue::IncompleteCustomImpacts { missing, .. } if missing.len() == 18
        ));
    }

    #[test]
    fn malformed_json_is_a_catalog_error() {
        let err = Catalog::from_json_str("{\"not\": \"an array\"}").unwrap_err();
        assert!(matches!(err.issues[0], CatalogIssue::Malformed(_)));
    }

    #[test]
    fn filter_keeps_intersecting_scopes() {
        let mut textile = entry("1c7f3e52-0b8d-4c6e-8a3f-5d2e9b4a7c20", "cotton");
        textile["scopes"] = json!(["textile", "object"]);
        let catalog = parse(vec![
            entry("8f2c8a4e-2f4b-4d7a-9a0e-7b1d0c9e6a11", "wheat, at farm"),
            textile,
        ])
        .unwrap();
        assert_eq!(catalog.filter(&[Scope::Object]).len(), 1);
        assert_eq!(catalog.filter(&[]).len(), 2);
    }
}
