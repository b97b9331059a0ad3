use ecoforge_schemas::activity::Scope;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EcoforgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse JSON from '{0}': {1}")]
    JsonParsing(String, #[source] serde_json::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Computation(#[from] ComputationError),
}

/// Every violation found while validating the activity catalog.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("catalog validation failed with {} issue(s):\n{}", .issues.len(), render_issues(.issues))]
pub struct CatalogError {
    pub issues: Vec<CatalogIssue>,
}

fn render_issues(issues: &[CatalogIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogIssue {
    #[error("malformed catalog: {0}")]
    Malformed(String),

    #[error("activity id '{0}' is not a valid UUID v4")]
    InvalidId(String),

    #[error("activity id '{0}' is declared more than once")]
    DuplicateId(String),

    #[error(
        "activity ({database}, {activity_name}, {}) is declared by several entries: {}",
        .location.as_deref().unwrap_or("no location"),
        .ids.join(", ")
    )]
    DuplicateActivity {
        database: String,
        activity_name: String,
        location: Option<String>,
        ids: Vec<String>,
    },

    #[error("activity '{0}' declares no scope")]
    EmptyScopes(String),

    #[error("activity '{id}' carries metadata for undeclared scope(s) {scopes:?}")]
    MetadataOutsideScopes { id: String, scopes: Vec<Scope> },

    #[error("activity '{id}' is missing mandatory field '{field}'")]
    MissingField { id: String, field: &'static str },

    #[error("custom activity '{id}' has incomplete impacts, missing {}", .missing.join(", "))]
    IncompleteCustomImpacts { id: String, missing: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("unknown LCI database '{0}'")]
    UnknownDatabase(String),

    #[error("ambiguous dataset for '{query}' in '{database}', candidates: {}", .matches.join("; "))]
    Ambiguous {
        database: String,
        query: String,
        matches: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("dataset '{dataset}' references unknown input '{input}'")]
    MissingInput { dataset: String, input: String },

    #[error("singular technosphere matrix while solving for dataset '{0}'")]
    SingularMatrix(String),

    #[error("unknown LCIA method '{0}'")]
    UnknownMethod(String),

    #[error("dataset '{code}' not found in database '{database}'")]
    UnknownDataset { database: String, code: String },

    #[error("activity '{0}' has neither a binding nor inline impacts")]
    Unbound(String),

    #[error("no impact backend could compute dataset '{0}'")]
    NoBackendAvailable(String),

    #[error("packaging activity '{0}' has neither PACKAGING_SYSTEM_G nor PACKAGING_SYSTEM_KG")]
    MissingMassPerUnit(String),

    #[error("impact '{trigram}' of activity '{id}' is not finite")]
    NonFinite { id: String, trigram: String },

    #[error("worker failed while computing activity '{0}': {1}")]
    WorkerPanicked(String, String),
}

/// The remote impact oracle could not answer; callers fall back to the local backend.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("remote impact oracle unavailable: {reason}")]
pub struct OracleUnavailable {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error(transparent)]
    Unavailable(#[from] OracleUnavailable),

    #[error(transparent)]
    Computation(#[from] ComputationError),
}
