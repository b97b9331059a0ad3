use crate::error::{ComputationError, EcoforgeError};
use ecoforge_schemas::file_formats::MethodFile;
use ecoforge_schemas::method::Method;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// LCIA methods available to a run, by method name.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<String, Method>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.insert(method);
        self
    }

    pub fn insert(&mut self, method: Method) {
        self.methods.insert(method.name.clone(), method);
    }

    pub fn load_file(path: &Path) -> Result<Method, EcoforgeError> {
        let name = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| EcoforgeError::FileIO(name.clone(), e))?;
        let file: MethodFile =
            serde_json::from_str(&content).map_err(|e| EcoforgeError::JsonParsing(name, e))?;
        Ok(file.method)
    }

    pub fn get(&self, name: &str) -> Result<&Method, ComputationError> {
        self.methods
            .get(name)
            .ok_or_else(|| ComputationError::UnknownMethod(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}
