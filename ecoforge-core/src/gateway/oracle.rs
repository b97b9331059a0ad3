use super::{ImpactBackend, ImpactRequest};
use crate::error::{BackendError, OracleUnavailable};
use ecoforge_schemas::activity::Unit;
use ecoforge_schemas::impacts::RawImpacts;
use ecoforge_schemas::method::Method;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub endpoint: String,
    pub project: String,
    /// Library queried for every dataset; defaults to the dataset's database name.
    pub library: Option<String>,
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn new(endpoint: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project: project.into(),
            library: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OracleScore {
    amount: f64,
}

/// Remote SimaPro impact oracle reached over HTTP.
pub struct SimaProOracle {
    config: OracleConfig,
    http_client: reqwest::blocking::Client,
}

impl SimaProOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleUnavailable> {
        let http_client = reqwest::blocking::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|error| OracleUnavailable {
                reason: format!("cannot build HTTP client: {error}"),
            })?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn fetch(&self, request: &ImpactRequest<'_>) -> Result<serde_json::Value, OracleUnavailable> {
        let library = self
            .config
            .library
            .as_deref()
            .unwrap_or(request.database);
        let response = self
            .http_client
            .get(&self.config.endpoint)
            .query(&[
                ("project", self.config.project.as_str()),
                ("library", library),
                ("method", request.method.name.as_str()),
                ("process", request.dataset.name.as_str()),
            ])
            .send()
            .map_err(|error| OracleUnavailable {
                reason: if error.is_timeout() {
                    format!("timed out: {error}")
                } else {
                    error.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleUnavailable {
                reason: format!("HTTP status {status}"),
            });
        }
        response.json().map_err(|error| OracleUnavailable {
            reason: format!("invalid response body: {error}"),
        })
    }
}

impl ImpactBackend for SimaProOracle {
    fn name(&self) -> &'static str {
        "simapro"
    }

    fn impacts(&mut self, request: &ImpactRequest<'_>) -> Result<RawImpacts, BackendError> {
        let body = self.fetch(request)?;
        let scale = unit_scale(Unit::parse(&request.dataset.unit)) * request.demand.abs();
        Ok(translate(&body, request.method, scale)?)
    }
}

/// SimaPro reports per kWh and per litre where the catalog works in MJ and m³.
fn unit_scale(unit: Option<Unit>) -> f64 {
    match unit {
        Some(Unit::KWh) => 3.6,
        Some(Unit::L) => 1.0 / 1000.0,
        _ => 1.0,
    }
}

/// Maps `{ fullIndicatorName: { amount, unit } }` back to indicator codes.
fn translate(
    body: &serde_json::Value,
    method: &Method,
    scale: f64,
) -> Result<RawImpacts, OracleUnavailable> {
    let entries = body.as_object().ok_or_else(|| OracleUnavailable {
        reason: "response is not a JSON object".to_string(),
    })?;

    let mut impacts = RawImpacts::new();
    for (name, value) in entries {
        let Some(indicator) = method.indicator_by_name(name) else {
            debug!(indicator = %name, "oracle indicator not in method registry, ignored");
            continue;
        };
        let score: OracleScore =
            serde_json::from_value(value.clone()).map_err(|error| OracleUnavailable {
                reason: format!("malformed score for '{name}': {error}"),
            })?;
        impacts.insert(indicator.code.clone(), score.amount * scale);
    }

    if impacts.is_empty() {
        return Err(OracleUnavailable {
            reason: "empty impact vector".to_string(),
        });
    }
    Ok(impacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoforge_schemas::lci::Dataset;
    use ecoforge_schemas::method::Indicator;
    use serde_json::json;

    fn method() -> Method {
        Method {
            name: "EF 3.1".to_string(),
            indicators: vec![
                Indicator {
                    code: "cch".to_string(),
                    name: "Climate change".to_string(),
                    unit: "kg CO2 eq".to_string(),
                    factors: vec![],
                },
                Indicator {
                    code: "etf1".to_string(),
                    name: "Ecotoxicity, freshwater - part 1".to_string(),
                    unit: "CTUe".to_string(),
                    factors: vec![],
                },
            ],
        }
    }

    #[test]
    fn translates_names_to_codes() {
        let body = json!({
            "Climate change": {"amount": 2.0, "unit": "kg CO2 eq"},
            "Ecotoxicity, freshwater - part 1": {"amount": 4.0, "unit": "CTUe"},
            "Something else": {"amount": 1.0, "unit": "?"}
        });
        let impacts = translate(&body, &method(), 3.6).unwrap();
        assert_eq!(impacts.len(), 2);
        assert!((impacts["cch"] - 7.2).abs() < 1e-12);
        assert!((impacts["etf1"] - 14.4).abs() < 1e-12);
    }

    #[test]
    fn non_object_or_empty_is_unavailable() {
        assert!(translate(&json!([1, 2]), &method(), 1.0).is_err());
        assert!(translate(&json!({"Other": {"amount": 1.0}}), &method(), 1.0).is_err());
    }

    #[test]
    fn unit_scaling() {
        assert_eq!(unit_scale(Some(Unit::KWh)), 3.6);
        assert_eq!(unit_scale(Some(Unit::L)), 0.001);
        assert_eq!(unit_scale(Some(Unit::Kg)), 1.0);
        assert_eq!(unit_scale(None), 1.0);
    }

    #[test]
    fn unreachable_endpoint_is_unavailable() {
        let mut config = OracleConfig::new("http://127.0.0.1:9/impacts", "Ecobalyse");
        config.timeout = Duration::from_secs(2);
        let mut oracle = SimaProOracle::new(config).unwrap();
        let method = method();
        let dataset: Dataset = serde_json::from_value(json!({
            "code": "d", "name": "Wheat, at farm", "unit": "kilogram", "production_amount": 1.0
        }))
        .unwrap();
        let request = ImpactRequest {
            database: "Agribalyse 3.1.1",
            dataset: &dataset,
            method: &method,
            demand: 1.0,
        };
        assert!(matches!(
            oracle.impacts(&request),
            Err(BackendError::Unavailable(_))
        ));
    }
}
