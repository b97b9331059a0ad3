use anyhow::{bail, Context, Result};
use ecoforge_core::catalog::Catalog;
use ecoforge_core::ecosystemic::{EcosystemicFactors, EcosystemicInputs, FeedTable, UgbTable};
use ecoforge_core::gateway::{MethodRegistry, OracleConfig};
use ecoforge_core::lci::{LciDatabase, LciStore};
use ecoforge_core::normalization::ImpactDefinitions;
use ecoforge_schemas::file_formats::{LciDatabaseFile, MethodFile};
use ecoforge_schemas::method::Method;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use tracing::info;

const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimaProConfig {
    pub url: String,
    pub project: String,
    #[serde(default)]
    pub library: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Credentials of the bucket holding raw LCI exports. Carried for the tooling that
/// refreshes `lci_databases`, never used by the export itself.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct S3Config {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
}

/// `ecoforge.yaml`. Relative paths are resolved against the file's directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub activities: PathBuf,
    pub impacts: PathBuf,
    /// Directory of LCI database files (`*.json`).
    pub lci_databases: PathBuf,
    /// Directory of LCIA method files (`*.json`).
    pub methods: PathBuf,
    pub method: String,
    #[serde(default)]
    pub land_occupation_method: Option<String>,
    #[serde(default)]
    pub ecosystemic_factors: Option<PathBuf>,
    #[serde(default)]
    pub feed: Option<PathBuf>,
    #[serde(default)]
    pub ugb: Option<PathBuf>,
    #[serde(default)]
    pub permanent_pasture_id: Option<String>,
    #[serde(default)]
    pub forest_complements: BTreeMap<String, f64>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// Where to dump the run report as CSV, if anywhere.
    #[serde(default)]
    pub report_csv: Option<PathBuf>,
    #[serde(default)]
    pub simapro: Option<SimaProConfig>,
    #[serde(default)]
    pub s3: S3Config,
}

impl Config {
    /// Reads the file, applies `EB_*` environment overrides and resolves paths.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {:?}", path))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        config.apply_overrides(|name| env::var(name).ok());
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("EB_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("EB_EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("EB_DB_CACHE_DIR") {
            self.lci_databases = PathBuf::from(dir);
        }
        if let Some(url) = lookup("EB_SIMAPRO_URL") {
            match &mut self.simapro {
                Some(simapro) => simapro.url = url,
                None => {
                    self.simapro = Some(SimaProConfig {
                        url,
                        project: String::new(),
                        library: None,
                        timeout_secs: None,
                    })
                }
            }
        }
        if let Some(key) = lookup("EB_S3_ACCESS_KEY_ID") {
            self.s3.access_key_id = Some(key);
        }
        if let Some(secret) = lookup("EB_S3_SECRET_ACCESS_KEY") {
            self.s3.secret_access_key = Some(secret);
        }
        if let Some(bucket) = lookup("EB_S3_BUCKET") {
            self.s3.bucket = Some(bucket);
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.activities);
        resolve(&mut self.impacts);
        resolve(&mut self.lci_databases);
        resolve(&mut self.methods);
        resolve(&mut self.output_dir);
        for path in [
            &mut self.ecosystemic_factors,
            &mut self.feed,
            &mut self.ugb,
            &mut self.export_dir,
            &mut self.report_csv,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }

    /// The public data directory first, then the external export directory if set.
    pub fn output_dirs(&self) -> Vec<&Path> {
        std::iter::once(self.output_dir.as_path())
            .chain(self.export_dir.as_deref())
            .collect()
    }

    pub fn oracle(&self) -> Result<OracleConfig> {
        let Some(simapro) = &self.simapro else {
            bail!("--simapro requires a 'simapro' section or EB_SIMAPRO_URL");
        };
        let mut oracle = OracleConfig::new(&simapro.url, &simapro.project);
        oracle.library = simapro.library.clone();
        oracle.timeout =
            Duration::from_secs(simapro.timeout_secs.unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECS));
        Ok(oracle)
    }
}

/// Every input of a run, loaded from the paths of a `Config`.
pub struct KnowledgeBase {
    pub catalog: Catalog,
    pub definitions: ImpactDefinitions,
    pub store: LciStore,
    pub methods: MethodRegistry,
    pub ecosystemic: EcosystemicInputs,
}

impl KnowledgeBase {
    pub fn load(config: &Config) -> Result<Self> {
        info!("loading inputs");
        let catalog = Catalog::load(&config.activities)?;
        let definitions = ImpactDefinitions::load(&config.impacts)?;

        let mut store = LciStore::new();
        let databases = load_json_files_into_map(
            &config.lci_databases,
            |file: LciDatabaseFile| vec![file],
            |file: &LciDatabaseFile| file.database.clone(),
        )?;
        for file in databases.into_values() {
            store.insert(LciDatabase::from_file(file)?);
        }

        let mut methods = MethodRegistry::new();
        let method_files = load_json_files_into_map(
            &config.methods,
            |file: MethodFile| vec![file.method],
            |method: &Method| method.name.clone(),
        )?;
        for method in method_files.into_values() {
            methods.insert(method);
        }

        let ecosystemic = EcosystemicInputs {
            factors: match &config.ecosystemic_factors {
                Some(path) => EcosystemicFactors::load(path)?,
                None => EcosystemicFactors::default(),
            },
            feed: match &config.feed {
                Some(path) => FeedTable::load(path)?,
                None => FeedTable::default(),
            },
            ugb: match &config.ugb {
                Some(path) => UgbTable::load(path)?,
                None => UgbTable::default(),
            },
            permanent_pasture_id: config.permanent_pasture_id.clone(),
        };

        info!(
            activities = catalog.len(),
            databases = store.names().count(),
            "inputs loaded"
        );
        Ok(Self {
            catalog,
            definitions,
            store,
            methods,
            ecosystemic,
        })
    }
}

/// Loads every JSON file of a directory into a map, in file name order.
fn load_json_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<BTreeMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>,
    E: Fn(F) -> Vec<T>,
    K: Fn(&T) -> String,
{
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut map = BTreeMap::new();
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let file_wrapper: F = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
        for item in extract_vec(file_wrapper) {
            let key = get_key(&item);
            if map.insert(key.clone(), item).is_some() {
                bail!("'{}' is defined twice (last in {:?})", key, path);
            }
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "
activities: data/activities.json
impacts: data/impacts.json
lci_databases: data/lci
methods: data/methods
method: EF 3.1
output_dir: public/data
forest_complements:
  sustainable: -8.0
simapro:
  url: http://localhost:8000/impact
  project: Ecobalyse
";

    #[test]
    fn parses_and_resolves_paths() {
        let mut config: Config = serde_yaml::from_str(YAML).unwrap();
        config.resolve_paths(Path::new("/srv/ecoforge"));
        assert_eq!(config.activities, PathBuf::from("/srv/ecoforge/data/activities.json"));
        assert_eq!(config.output_dirs(), vec![Path::new("/srv/ecoforge/public/data")]);
        assert_eq!(config.forest_complements["sustainable"], -8.0);
        assert_eq!(config.oracle().unwrap().timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_win() {
        let mut config: Config = serde_yaml::from_str(YAML).unwrap();
        let env = BTreeMap::from([
            ("EB_OUTPUT_DIR", "/tmp/out"),
            ("EB_EXPORT_DIR", "/tmp/export"),
            ("EB_SIMAPRO_URL", "http://simapro:8000/impact"),
            ("EB_S3_BUCKET", "raw-lci"),
        ]);
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(
            config.output_dirs(),
            vec![Path::new("/tmp/out"), Path::new("/tmp/export")]
        );
        assert_eq!(config.simapro.unwrap().url, "http://simapro:8000/impact");
        assert_eq!(config.s3.bucket.as_deref(), Some("raw-lci"));
    }

    #[test]
    fn loads_json_directory_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), r#"{"name": "b"}"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"{"name": "a"}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        #[derive(Deserialize)]
        struct Named {
            name: String,
        }
        let map = load_json_files_into_map(dir.path(), |n: Named| vec![n], |n: &Named| n.name.clone())
            .unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
