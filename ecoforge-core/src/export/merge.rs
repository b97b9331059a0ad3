use ecoforge_schemas::activity::Scope;
use serde_json::Value;
use std::collections::HashSet;

fn record_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn touches_scopes(record: &Value, scopes: &[Scope]) -> bool {
    if scopes.is_empty() {
        return true;
    }
    record
        .get("scopes")
        .and_then(Value::as_array)
        .is_some_and(|declared| {
            declared
                .iter()
                .filter_map(Value::as_str)
                .any(|s| scopes.iter().any(|scope| scope.as_str() == s))
        })
}

/// Sorts records by their stringified `id`.
pub fn sort_by_id(records: &mut [Value]) {
    records.sort_by_cached_key(record_id);
}

/// Existing records outside the run's scopes are kept verbatim; the others are
/// replaced by `fresh`. An empty scope filter replaces everything.
pub fn merge(existing: Vec<Value>, fresh: Vec<Value>, scopes: &[Scope]) -> Vec<Value> {
    let fresh_ids: HashSet<String> = fresh.iter().map(record_id).collect();
    let mut merged: Vec<Value> = existing
        .into_iter()
        .filter(|record| !touches_scopes(record, scopes) && !fresh_ids.contains(&record_id(record)))
        .collect();
    merged.extend(fresh);
    sort_by_id(&mut merged);
    merged
}
