//! Output artifacts of a run, written once per output directory.

pub mod diff;
pub mod format;
pub mod merge;
pub mod writer;

use crate::error::EcoforgeError;
use crate::pipeline::PipelineOutput;
use ecoforge_schemas::activity::Scope;
use ecoforge_schemas::impacts::Trigram;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

pub use diff::ProcessDiff;
pub use format::{format_number, to_canonical_json};
pub use writer::{write_atomic, Artifact};

pub const PROCESSES_IMPACTS_FILE: &str = "processes_impacts.json";
pub const PROCESSES_FILE: &str = "processes.json";
pub const INGREDIENTS_FILE: &str = "ingredients.json";
pub const MATERIALS_FILE: &str = "materials.json";
pub const GENERIC_PROCESSES_FILE: &str = "processes_generic.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub directory: PathBuf,
    pub written: Vec<PathBuf>,
    /// Comparison with the previous `processes_impacts.json`, when there was one.
    pub diff: Option<ProcessDiff>,
}

fn to_records<T: Serialize>(items: &[T]) -> Result<Vec<Value>, EcoforgeError> {
    let mut records = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    merge::sort_by_id(&mut records);
    Ok(records)
}

/// Copy of a process record where every impact but `pef` and `ecs` is zero.
pub fn aggregated_record(record: &Value) -> Value {
    let mut record = record.clone();
    if let Some(impacts) = record.get_mut("impacts").and_then(Value::as_object_mut) {
        for (code, value) in impacts.iter_mut() {
            let keep = matches!(code.parse::<Trigram>(), Ok(t) if t.is_aggregate());
            if !keep {
                *value = Value::from(0);
            }
        }
    }
    record
}

fn selected(scopes: &[Scope], candidates: &[Scope]) -> bool {
    scopes.is_empty() || candidates.iter().any(|c| scopes.contains(c))
}

/// Domain views owned by the scopes of the run.
fn metadata_artifacts(output: &PipelineOutput, scopes: &[Scope]) -> Result<Vec<Artifact>, EcoforgeError> {
    let mut artifacts = Vec::new();
    if selected(scopes, &[Scope::Food]) {
        artifacts.push(Artifact {
            file_name: INGREDIENTS_FILE,
            content: to_canonical_json(&Value::Array(to_records(&output.ingredients)?)),
        });
    }
    if selected(scopes, &[Scope::Textile]) {
        artifacts.push(Artifact {
            file_name: MATERIALS_FILE,
            content: to_canonical_json(&Value::Array(to_records(&output.materials)?)),
        });
    }
    if selected(scopes, &[Scope::Object, Scope::Veli]) {
        artifacts.push(Artifact {
            file_name: GENERIC_PROCESSES_FILE,
            content: to_canonical_json(&Value::Array(to_records(&output.generic)?)),
        });
    }
    Ok(artifacts)
}

/// Writes the process files and the domain views into `dir`. Every artifact is
/// rendered before the first one is written.
///
/// # Errors
///
/// In merge mode, a previous `processes_impacts.json` that cannot be read or parsed
/// stops the export before anything is written.
pub fn export_processes(
    dir: &Path,
    output: &PipelineOutput,
    scopes: &[Scope],
    merge_existing: bool,
) -> Result<ExportSummary, EcoforgeError> {
    let fresh = to_records(&output.processes)?;
    let previous_path = dir.join(PROCESSES_IMPACTS_FILE);
    let previous = if merge_existing {
        diff::read_previous(&previous_path)?
    } else {
        diff::load_previous(&previous_path)
    };

    let records = match (&previous, merge_existing) {
        (Some(existing), true) => merge::merge(existing.clone(), fresh, scopes),
        (None, true) => {
            info!(directory = %dir.display(), "nothing to merge with, writing a fresh export");
            fresh
        }
        (_, false) => fresh,
    };
    let diff = previous.as_deref().map(|previous| diff::diff(previous, &records));
    let aggregated: Vec<Value> = records.iter().map(aggregated_record).collect();

    let mut artifacts = vec![
        Artifact {
            file_name: PROCESSES_IMPACTS_FILE,
            content: to_canonical_json(&Value::Array(records)),
        },
        Artifact {
            file_name: PROCESSES_FILE,
            content: to_canonical_json(&Value::Array(aggregated)),
        },
    ];
    artifacts.extend(metadata_artifacts(output, scopes)?);

    let written = writer::write_artifacts(dir, &artifacts)?;
    Ok(ExportSummary {
        directory: dir.to_path_buf(),
        written,
        diff,
    })
}

/// Writes only the domain views into `dir`.
pub fn export_metadata(
    dir: &Path,
    output: &PipelineOutput,
    scopes: &[Scope],
) -> Result<ExportSummary, EcoforgeError> {
    let artifacts = metadata_artifacts(output, scopes)?;
    let written = writer::write_artifacts(dir, &artifacts)?;
    Ok(ExportSummary {
        directory: dir.to_path_buf(),
        written,
        diff: None,
    })
}
