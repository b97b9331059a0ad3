use crate::{lci::Dataset, method::Method};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LciDatabaseFile {
    pub schema_version: String,
    pub database: String,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MethodFile {
    pub schema_version: String,
    pub method: Method,
}
