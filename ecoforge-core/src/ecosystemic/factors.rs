use crate::error::EcoforgeError;
use ecoforge_schemas::activity::Scenario;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Service {
    Hedges,
    PlotSize,
    CropDiversity,
    LivestockDensity,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::Hedges,
        Service::PlotSize,
        Service::CropDiversity,
        Service::LivestockDensity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Service::Hedges => "hedges",
            Service::PlotSize => "plotSize",
            Service::CropDiversity => "cropDiversity",
            Service::LivestockDensity => "livestockDensity",
        }
    }
}

fn parse_scenario(label: &str) -> Option<Scenario> {
    match label {
        "reference" => Some(Scenario::Reference),
        "organic" => Some(Scenario::Organic),
        "import" => Some(Scenario::Import),
        _ => None,
    }
}

/// `<service>_<scenario>` column header.
fn parse_column(header: &str) -> Option<(Service, Scenario)> {
    let (service, scenario) = header.split_once('_')?;
    let service = Service::ALL.into_iter().find(|s| s.as_str() == service)?;
    Some((service, parse_scenario(scenario)?))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn open(path: &Path) -> Result<fs::File, EcoforgeError> {
    fs::File::open(path).map_err(|e| EcoforgeError::FileIO(path.display().to_string(), e))
}

/// `ecosystemicFactors[group][service][scenario]`.
#[derive(Debug, Clone, Default)]
pub struct EcosystemicFactors {
    by_group: BTreeMap<String, BTreeMap<(Service, Scenario), f64>>,
}

impl EcosystemicFactors {
    pub fn load(path: &Path) -> Result<Self, EcoforgeError> {
        Self::from_reader(open(path)?, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, EcoforgeError> {
        let mut reader = csv_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| EcoforgeError::CsvError(source.to_string(), e))?
            .clone();
        let group_column = headers.iter().position(|h| h == "group").ok_or_else(|| {
            EcoforgeError::ConfigError(format!("'{source}' has no 'group' column"))
        })?;
        let columns: Vec<Option<(Service, Scenario)>> = headers.iter().map(parse_column).collect();
        for (header, column) in headers.iter().zip(&columns) {
            if column.is_none() && header != "group" {
                debug!(column = header, "ignoring ecosystemic factor column");
            }
        }

        let mut by_group = BTreeMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| EcoforgeError::CsvError(source.to_string(), e))?;
            let group = record.get(group_column).unwrap_or_default().to_string();
            let mut values = BTreeMap::new();
            for (cell, column) in record.iter().zip(&columns) {
                let Some(key) = column else { continue };
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell.replace(',', ".").parse().map_err(|_| {
                    EcoforgeError::ConfigError(format!(
                        "'{source}': group '{group}' has a non-numeric {} value '{cell}'",
                        key.0.as_str()
                    ))
                })?;
                values.insert(*key, value);
            }
            by_group.insert(group, values);
        }
        Ok(Self { by_group })
    }

    pub fn get(&self, group: &str, service: Service, scenario: Scenario) -> Option<f64> {
        self.by_group.get(group)?.get(&(service, scenario)).copied()
    }
}

/// `feed[animalActivityId][ingredientActivityId]` in kg of feed per kg of product.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FeedTable(BTreeMap<String, BTreeMap<String, f64>>);

impl FeedTable {
    pub fn load(path: &Path) -> Result<Self, EcoforgeError> {
        let name = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| EcoforgeError::FileIO(name.clone(), e))?;
        serde_json::from_str(&content).map_err(|e| EcoforgeError::JsonParsing(name, e))
    }

    pub fn composition(&self, animal_id: &str) -> Option<&BTreeMap<String, f64>> {
        self.0.get(animal_id)
    }
}

impl FromIterator<(String, BTreeMap<String, f64>)> for FeedTable {
    fn from_iter<I: IntoIterator<Item = (String, BTreeMap<String, f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
struct UgbRow {
    #[serde(rename = "animalGroup2")]
    animal_group2: String,
    #[serde(rename = "animalProduct")]
    animal_product: String,
    value: f64,
}

/// Livestock units per kg of product, by `(animalGroup2, animalProduct)`.
#[derive(Debug, Clone, Default)]
pub struct UgbTable {
    values: BTreeMap<(String, String), f64>,
}

impl UgbTable {
    pub fn load(path: &Path) -> Result<Self, EcoforgeError> {
        Self::from_reader(open(path)?, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, EcoforgeError> {
        let mut values = BTreeMap::new();
        for row in csv_reader(reader).deserialize() {
            let row: UgbRow = row.map_err(|e| EcoforgeError::CsvError(source.to_string(), e))?;
            values.insert((row.animal_group2, row.animal_product), row.value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, animal_group2: &str, animal_product: &str) -> Option<f64> {
        self.values
            .get(&(animal_group2.to_string(), animal_product.to_string()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_factor_table() {
        let csv = "group;hedges_reference;hedges_organic;plotSize_reference;cropDiversity_import;notes\n\
                   BLE TENDRE;70;120;4,5;9;soft wheat\n\
                   BOVINS;;;;;\n";
        let factors = EcosystemicFactors::from_reader(csv.as_bytes(), "factors.csv").unwrap();
        assert_eq!(factors.get("BLE TENDRE", Service::Hedges, Scenario::Reference), Some(70.0));
        assert_eq!(factors.get("BLE TENDRE", Service::Hedges, Scenario::Organic), Some(120.0));
        assert_eq!(factors.get("BLE TENDRE", Service::PlotSize, Scenario::Reference), Some(4.5));
        assert_eq!(factors.get("BLE TENDRE", Service::CropDiversity, Scenario::Import), Some(9.0));
        assert_eq!(factors.get("BOVINS", Service::Hedges, Scenario::Reference), None);
        assert_eq!(factors.get("MAIS", Service::Hedges, Scenario::Reference), None);
    }

    #[test]
    fn rejects_non_numeric_factor() {
        let csv = "group;hedges_reference\nBLE;lots\n";
        assert!(matches!(
            EcosystemicFactors::from_reader(csv.as_bytes(), "factors.csv"),
            Err(EcoforgeError::ConfigError(_))
        ));
    }

    #[test]
    fn reads_ugb_table() {
        let csv = "animalGroup2;animalProduct;value\ncow;milk;0.00012\ncow;meat;0.0021\n";
        let ugb = UgbTable::from_reader(csv.as_bytes(), "ugb.csv").unwrap();
        assert_eq!(ugb.get("cow", "milk"), Some(0.00012));
        assert_eq!(ugb.get("pig", "meat"), None);
    }
}
