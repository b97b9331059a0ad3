use crate::error::EcoforgeError;
use ecoforge_schemas::file_formats::LciDatabaseFile;
use ecoforge_schemas::lci::Dataset;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// One read-only LCI database, indexed by dataset code.
#[derive(Debug, Clone)]
pub struct LciDatabase {
    name: String,
    datasets: Vec<Dataset>,
    by_code: HashMap<String, usize>,
}

impl LciDatabase {
    pub fn new(name: impl Into<String>, datasets: Vec<Dataset>) -> Result<Self, EcoforgeError> {
        let name = name.into();
        let mut by_code = HashMap::with_capacity(datasets.len());
        for (i, dataset) in datasets.iter().enumerate() {
            if by_code.insert(dataset.code.clone(), i).is_some() {
                return Err(EcoforgeError::ConfigError(format!(
                    "database '{name}' declares dataset code '{}' twice",
                    dataset.code
                )));
            }
        }
        Ok(Self {
            name,
            datasets,
            by_code,
        })
    }

    pub fn from_file(file: LciDatabaseFile) -> Result<Self, EcoforgeError> {
        Self::new(file.database, file.datasets)
    }

    pub fn load(path: &Path) -> Result<Self, EcoforgeError> {
        let name = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| EcoforgeError::FileIO(name.clone(), e))?;
        let file: LciDatabaseFile =
            serde_json::from_str(&content).map_err(|e| EcoforgeError::JsonParsing(name, e))?;
        Self::from_file(file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, code: &str) -> Option<&Dataset> {
        self.by_code.get(code).map(|&i| &self.datasets[i])
    }

    /// Free-text search: every word of the query must occur in the dataset name,
    /// ignoring case and punctuation.
    pub fn search(&self, query: &str) -> Vec<&Dataset> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }
        self.datasets
            .iter()
            .filter(|d| {
                let name = d.name.to_lowercase();
                terms.iter().all(|t| name.contains(t.as_str()))
            })
            .collect()
    }
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Every LCI database available to a run, by name.
#[derive(Debug, Clone, Default)]
pub struct LciStore {
    databases: BTreeMap<String, LciDatabase>,
}

impl LciStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: LciDatabase) -> Self {
        self.insert(database);
        self
    }

    pub fn insert(&mut self, database: LciDatabase) {
        self.databases.insert(database.name().to_string(), database);
    }

    pub fn database(&self, name: &str) -> Option<&LciDatabase> {
        self.databases.get(name)
    }

    pub fn dataset(&self, database: &str, code: &str) -> Option<&Dataset> {
        self.database(database)?.get(code)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }
}
