use super::Pipeline;
use crate::catalog::Catalog;
use crate::ecosystemic::EcosystemicInputs;
use crate::error::EcoforgeError;
use crate::gateway::{MethodRegistry, OracleConfig};
use crate::lci::LciStore;
use crate::normalization::ImpactDefinitions;
use std::collections::BTreeMap;

/// A fluent builder for constructing a `Pipeline`.
///
/// The catalog, the normalization table and the LCIA method name are mandatory;
/// everything else has a usable default.
#[derive(Default)]
pub struct PipelineBuilder {
    catalog: Option<Catalog>,
    definitions: Option<ImpactDefinitions>,
    store: LciStore,
    methods: MethodRegistry,
    method: Option<String>,
    land_occupation_method: Option<String>,
    ecosystemic: EcosystemicInputs,
    forest_complements: BTreeMap<String, f64>,
    oracle: Option<OracleConfig>,
    cpu_count: Option<usize>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_definitions(mut self, definitions: ImpactDefinitions) -> Self {
        self.definitions = Some(definitions);
        self
    }

    pub fn with_store(mut self, store: LciStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_methods(mut self, methods: MethodRegistry) -> Self {
        self.methods = methods;
        self
    }

    /// Name of the LCIA method impacts are computed with.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Method whose indicators sum up to the land occupation of an ingredient.
    pub fn with_land_occupation_method(mut self, method: Option<String>) -> Self {
        self.land_occupation_method = method;
        self
    }

    pub fn with_ecosystemic_inputs(mut self, inputs: EcosystemicInputs) -> Self {
        self.ecosystemic = inputs;
        self
    }

    /// Forest complement per forest management mode, for object variants.
    pub fn with_forest_complements(mut self, complements: BTreeMap<String, f64>) -> Self {
        self.forest_complements = complements;
        self
    }

    /// Queries the remote oracle before falling back to the local backend.
    pub fn with_oracle(mut self, oracle: Option<OracleConfig>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_cpu_count(mut self, cpu_count: Option<usize>) -> Self {
        self.cpu_count = cpu_count;
        self
    }

    /// Consumes the builder and returns a fully configured `Pipeline`.
    ///
    /// # Errors
    ///
    /// Returns `EcoforgeError::ConfigError` when a mandatory input is missing or when a
    /// configured method is not in the method registry.
    pub fn build(self) -> Result<Pipeline, EcoforgeError> {
        let catalog = self
            .catalog
            .ok_or_else(|| EcoforgeError::ConfigError("no activity catalog provided".to_string()))?;
        let definitions = self.definitions.ok_or_else(|| {
            EcoforgeError::ConfigError("no impact definitions provided".to_string())
        })?;
        let method = self
            .method
            .ok_or_else(|| EcoforgeError::ConfigError("no LCIA method selected".to_string()))?;

        for name in std::iter::once(&method).chain(self.land_occupation_method.as_ref()) {
            if !self.methods.contains(name) {
                return Err(EcoforgeError::ConfigError(format!(
                    "LCIA method '{name}' is not in the method registry"
                )));
            }
        }

        Ok(Pipeline {
            catalog,
            definitions,
            store: self.store,
            methods: self.methods,
            method,
            land_occupation_method: self.land_occupation_method,
            ecosystemic: self.ecosystemic,
            forest_complements: self.forest_complements,
            oracle: self.oracle,
            cpu_count: self.cpu_count,
        })
    }
}
