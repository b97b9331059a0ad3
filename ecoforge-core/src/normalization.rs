use crate::error::EcoforgeError;
use ecoforge_schemas::impact_definition::{CorrectionEntry, ImpactDefinition, Weighting};
use ecoforge_schemas::impacts::Trigram;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The two weighted single scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Pef,
    Ecoscore,
}

impl Aggregate {
    pub const ALL: [Aggregate; 2] = [Aggregate::Pef, Aggregate::Ecoscore];

    pub fn trigram(self) -> Trigram {
        match self {
            Aggregate::Pef => Trigram::Pef,
            Aggregate::Ecoscore => Trigram::Ecs,
        }
    }
}

/// Per-trigram normalization, weighting and correction data from `impacts.json`.
///
/// Built once per run and shared read-only with every worker.
#[derive(Debug, Clone, Default)]
pub struct ImpactDefinitions {
    definitions: BTreeMap<Trigram, ImpactDefinition>,
}

impl ImpactDefinitions {
    pub fn load(path: &Path) -> Result<Self, EcoforgeError> {
        let name = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| EcoforgeError::FileIO(name.clone(), e))?;
        let raw: BTreeMap<String, ImpactDefinition> =
            serde_json::from_str(&content).map_err(|e| EcoforgeError::JsonParsing(name, e))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: BTreeMap<String, ImpactDefinition>) -> Result<Self, EcoforgeError> {
        let mut definitions = BTreeMap::new();
        for (code, definition) in raw {
            let trigram: Trigram = code
                .parse()
                .map_err(|e| EcoforgeError::ConfigError(format!("impacts definition: {e}")))?;
            if let Some(corrections) = &definition.correction {
                if !trigram.is_corrected() {
                    return Err(EcoforgeError::ConfigError(format!(
                        "impacts definition: '{trigram}' declares a correction but is not a corrected indicator"
                    )));
                }
                if corrections.is_empty() {
                    return Err(EcoforgeError::ConfigError(format!(
                        "impacts definition: '{trigram}' declares an empty correction"
                    )));
                }
            }
            definitions.insert(trigram, definition);
        }
        Ok(Self { definitions })
    }

    pub fn get(&self, trigram: Trigram) -> Option<&ImpactDefinition> {
        self.definitions.get(&trigram)
    }

    fn weighting(&self, aggregate: Aggregate, trigram: Trigram) -> Option<&Weighting> {
        let definition = self.definitions.get(&trigram)?;
        match aggregate {
            Aggregate::Pef => definition.pef.as_ref(),
            Aggregate::Ecoscore => definition.ecoscore.as_ref(),
        }
    }

    /// `(normalization, weighting)` of a trigram inside an aggregate. Trigrams without a
    /// usable normalization do not take part in the aggregate.
    pub fn factors(&self, aggregate: Aggregate, trigram: Trigram) -> Option<(f64, f64)> {
        let weighting = self.weighting(aggregate, trigram)?;
        let normalization = weighting.normalization.filter(|n| *n != 0.0)?;
        Some((normalization, weighting.weighting.unwrap_or(0.0)))
    }

    /// Corrected trigrams with the sub-impacts they are rebuilt from.
    pub fn corrections(&self) -> impl Iterator<Item = (Trigram, &[CorrectionEntry])> {
        self.definitions.iter().filter_map(|(trigram, definition)| {
            definition
                .correction
                .as_deref()
                .map(|entries| (*trigram, entries))
        })
    }
}
