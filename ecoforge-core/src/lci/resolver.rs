use super::store::LciStore;
use crate::error::ResolutionError;
use ecoforge_schemas::activity::Activity;
use ecoforge_schemas::lci::Dataset;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A catalog activity bound to one dataset. Owned so it can be handed to workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub database: String,
    pub code: String,
}

impl Binding {
    pub fn dataset<'s>(&self, store: &'s LciStore) -> Option<&'s Dataset> {
        store.dataset(&self.database, &self.code)
    }
}

type CacheKey = (String, String, Option<String>);

/// Binds catalog activities to datasets, caching lookups for the duration of a run.
pub struct Resolver<'a> {
    store: &'a LciStore,
    cache: HashMap<CacheKey, Result<Option<Binding>, ResolutionError>>,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a LciStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Binds an activity. Custom activities never bind; `Ok(None)` means nothing matched
    /// and the activity is dropped from impact computation.
    pub fn resolve(&mut self, activity: &Activity) -> Result<Option<Binding>, ResolutionError> {
        if activity.is_custom() {
            return Ok(None);
        }
        self.lookup(
            &activity.source,
            &activity.activity_name,
            activity.location.as_deref(),
        )
    }

    pub fn lookup(
        &mut self,
        database: &str,
        query: &str,
        location: Option<&str>,
    ) -> Result<Option<Binding>, ResolutionError> {
        let key = (
            database.to_string(),
            query.to_string(),
            location.map(str::to_string),
        );
        if let Some(cached) = self.cache.get(&key) {
            debug!(database, query, "resolver cache hit");
            return cached.clone();
        }
        let result = self.search(database, query, location);
        self.cache.insert(key, result.clone());
        result
    }

    fn search(
        &self,
        database: &str,
        query: &str,
        location: Option<&str>,
    ) -> Result<Option<Binding>, ResolutionError> {
        let db = self
            .store
            .database(database)
            .ok_or_else(|| ResolutionError::UnknownDatabase(database.to_string()))?;

        let mut matches = db.search(query);
        if let Some(location) = location {
            matches.retain(|d| d.location.as_deref() == Some(location));
        }

        let bind = |d: &Dataset| Binding {
            database: database.to_string(),
            code: d.code.clone(),
        };

        match matches.len() {
            0 => {
                warn!(database, query, ?location, "no dataset found, activity dropped");
                Ok(None)
            }
            1 => Ok(Some(bind(matches[0]))),
            _ => {
                let exact: Vec<&Dataset> =
                    matches.iter().copied().filter(|d| d.name == query).collect();
                if exact.len() == 1 {
                    return Ok(Some(bind(exact[0])));
                }
                let mut candidates: Vec<&Dataset> = if exact.is_empty() { matches } else { exact };
                candidates.sort_by(|a, b| {
                    (&a.name, &a.location, &a.code).cmp(&(&b.name, &b.location, &b.code))
                });
                Err(ResolutionError::Ambiguous {
                    database: database.to_string(),
                    query: query.to_string(),
                    matches: candidates
                        .iter()
                        .map(|d| {
                            format!(
                                "{} [{}] ({})",
                                d.name,
                                d.location.as_deref().unwrap_or("-"),
                                d.code
                            )
                        })
                        .collect(),
                })
            }
        }
    }
}
