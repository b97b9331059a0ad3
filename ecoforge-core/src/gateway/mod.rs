//! Uniform access to impact computations for a single (dataset, method) pair.
//!
//! Backends are tried in preference order. A backend reporting
//! [`OracleUnavailable`] hands over to the next one; any other error is final for
//! the dataset.

pub mod local;
pub mod oracle;
pub mod registry;

use crate::error::{BackendError, ComputationError, OracleUnavailable};
use crate::numeric::round_significant;
use ecoforge_schemas::impacts::RawImpacts;
use ecoforge_schemas::lci::Dataset;
use ecoforge_schemas::method::Method;
use tracing::{debug, warn};

pub use local::LocalBackend;
pub use oracle::{OracleConfig, SimaProOracle};
pub use registry::MethodRegistry;

/// Significant digits kept on gateway output, enough to absorb run-to-run noise.
pub const GATEWAY_SIGNIFICANT_DIGITS: usize = 10;

pub struct ImpactRequest<'r> {
    pub database: &'r str,
    pub dataset: &'r Dataset,
    pub method: &'r Method,
    pub demand: f64,
}

pub trait ImpactBackend {
    fn name(&self) -> &'static str;

    fn impacts(&mut self, request: &ImpactRequest<'_>) -> Result<RawImpacts, BackendError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResult {
    pub impacts: RawImpacts,
    pub backend: &'static str,
    pub fallbacks: Vec<OracleUnavailable>,
}

pub struct Gateway<'a> {
    methods: &'a MethodRegistry,
    backends: Vec<Box<dyn ImpactBackend + 'a>>,
}

impl<'a> Gateway<'a> {
    pub fn new(methods: &'a MethodRegistry) -> Self {
        Self {
            methods,
            backends: Vec::new(),
        }
    }

    /// Appends a backend after the ones already registered.
    pub fn with_backend(mut self, backend: impl ImpactBackend + 'a) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Impacts of `demand` units of `dataset` under `method_name`. Demand defaults to
    /// the sign of the dataset's production amount.
    pub fn impacts(
        &mut self,
        database: &str,
        dataset: &Dataset,
        method_name: &str,
        demand: Option<f64>,
    ) -> Result<GatewayResult, ComputationError> {
        let method = self.methods.get(method_name)?;
        let request = ImpactRequest {
            database,
            dataset,
            method,
            demand: demand.unwrap_or_else(|| dataset.production_sign()),
        };

        let mut fallbacks = Vec::new();
        for backend in self.backends.iter_mut() {
            match backend.impacts(&request) {
                Ok(impacts) => {
                    debug!(
                        backend = backend.name(),
                        dataset = %dataset.name,
                        method = method_name,
                        "impacts computed"
                    );
                    return Ok(GatewayResult {
                        impacts: impacts
                            .into_iter()
                            .map(|(code, v)| (code, round_significant(v, GATEWAY_SIGNIFICANT_DIGITS)))
                            .collect(),
                        backend: backend.name(),
                        fallbacks,
                    });
                }
                Err(BackendError::Unavailable(unavailable)) => {
                    warn!(
                        backend = backend.name(),
                        dataset = %dataset.name,
                        reason = %unavailable.reason,
                        "backend unavailable, falling back"
                    );
                    fallbacks.push(unavailable);
                }
                Err(BackendError::Computation(err)) => return Err(err),
            }
        }
        Err(ComputationError::NoBackendAvailable(dataset.name.clone()))
    }
}
