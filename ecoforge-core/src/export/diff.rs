use crate::error::EcoforgeError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Relative changes at or below this are not reported.
pub const CHANGE_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct ImpactChange {
    pub id: String,
    pub trigram: String,
    pub before: f64,
    pub after: f64,
}

impl ImpactChange {
    /// `None` when the previous value was zero.
    pub fn relative_change(&self) -> Option<f64> {
        (self.before != 0.0).then(|| (self.after - self.before) / self.before.abs())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessDiff {
    pub changes: Vec<ImpactChange>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ProcessDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    pub fn render_table(&self) -> String {
        if self.is_empty() {
            return String::from("No impact change above 0.1%.\n");
        }
        let mut table = String::new();
        if !self.changes.is_empty() {
            table.push_str(&format!(
                "| {:<36} | {:<6} | {:>12} | {:>12} | {:>9}\n",
                "Process", "Impact", "Before", "After", "Change"
            ));
            table.push_str(&format!(
                "|{}|{}|{}|{}|{}\n",
                "-".repeat(38),
                "-".repeat(8),
                "-".repeat(14),
                "-".repeat(14),
                "-".repeat(10)
            ));
            for change in &self.changes {
                let relative = match change.relative_change() {
                    Some(ratio) => format!("{:+.2}%", ratio * 100.0),
                    None => String::from("new"),
                };
                table.push_str(&format!(
                    "| {:<36} | {:<6} | {:>12.6e} | {:>12.6e} | {:>9}\n",
                    change.id, change.trigram, change.before, change.after, relative
                ));
            }
        }
        for id in &self.added {
            table.push_str(&format!("+ {id}\n"));
        }
        for id in &self.removed {
            table.push_str(&format!("- {id}\n"));
        }
        table
    }
}

/// Reads a previous `processes_impacts.json`. `Ok(None)` when there is no such file.
pub fn read_previous(path: &Path) -> Result<Option<Vec<Value>>, EcoforgeError> {
    if !path.exists() {
        return Ok(None);
    }
    let name = path.display().to_string();
    let content =
        fs::read_to_string(path).map_err(|e| EcoforgeError::FileIO(name.clone(), e))?;
    let records = serde_json::from_str(&content).map_err(|e| EcoforgeError::JsonParsing(name, e))?;
    Ok(Some(records))
}

/// The previous export for comparison only. A missing or unreadable file means
/// there is nothing to compare with.
pub fn load_previous(path: &Path) -> Option<Vec<Value>> {
    match read_previous(path) {
        Ok(None) => {
            info!(path = %path.display(), "no previous export to compare with");
            None
        }
        Ok(records) => records,
        Err(error) => {
            warn!(%error, "previous export ignored");
            None
        }
    }
}

fn impacts_by_id(records: &[Value]) -> BTreeMap<String, BTreeMap<String, f64>> {
    records
        .iter()
        .filter_map(|record| {
            let id = record.get("id")?.as_str()?.to_string();
            let impacts = record
                .get("impacts")
                .and_then(Value::as_object)
                .map(|map| {
                    map.iter()
                        .filter_map(|(k, v)| Some((k.clone(), v.as_f64()?)))
                        .collect()
                })
                .unwrap_or_default();
            Some((id, impacts))
        })
        .collect()
}

/// Per-trigram changes above [`CHANGE_THRESHOLD`], sorted by id then trigram, plus
/// added and removed ids.
pub fn diff(previous: &[Value], current: &[Value]) -> ProcessDiff {
    let before = impacts_by_id(previous);
    let after = impacts_by_id(current);

    let mut result = ProcessDiff::default();
    for (id, new_impacts) in &after {
        let Some(old_impacts) = before.get(id) else {
            result.added.push(id.clone());
            continue;
        };
        for (trigram, new_value) in new_impacts {
            let old_value = old_impacts.get(trigram).copied().unwrap_or(0.0);
            let significant = if old_value == 0.0 {
                *new_value != 0.0
            } else {
                ((new_value - old_value) / old_value).abs() > CHANGE_THRESHOLD
            };
            if significant {
                result.changes.push(ImpactChange {
                    id: id.clone(),
                    trigram: trigram.clone(),
                    before: old_value,
                    after: *new_value,
                });
            }
        }
    }
    result.removed = before
        .keys()
        .filter(|id| !after.contains_key(*id))
        .cloned()
        .collect();
    result
}
