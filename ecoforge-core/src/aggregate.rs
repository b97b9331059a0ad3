//! Turns raw indicator scores into the published impact vector: sub-impact
//! folding, corrected indicators and the PEF / Ecoscore single scores.

use crate::normalization::{Aggregate, ImpactDefinitions};
use ecoforge_schemas::impacts::{Impacts, RawImpacts, Trigram};
use tracing::debug;

/// Aggregates are expressed in micro-points.
pub const MICRO_POINTS: f64 = 1e6;

/// Indicators split in two parts by some LCIA methods, with the parts they sum.
const SPLIT_INDICATORS: [(&str, [&str; 2]); 2] =
    [("etf", ["etf1", "etf2"]), ("etf-o", ["etf-o1", "etf-o2"])];

/// `etf = etf1 + etf2` and `etf-o = etf-o1 + etf-o2`; the parts are dropped.
pub fn fold_split_indicators(raw: &mut RawImpacts) {
    for (total, parts) in SPLIT_INDICATORS {
        let present: Vec<f64> = parts.iter().filter_map(|p| raw.remove(*p)).collect();
        if !present.is_empty() {
            raw.insert(total.to_string(), present.iter().sum());
        }
    }
}

/// Builds every corrected indicator missing from `raw` as `Σ weighting · sub-impact`,
/// then removes the sub-impacts the corrections refer to.
pub fn apply_corrections(raw: &mut RawImpacts, definitions: &ImpactDefinitions) {
    let mut consumed = Vec::new();
    for (trigram, entries) in definitions.corrections() {
        if !raw.contains_key(trigram.code()) {
            let value = entries
                .iter()
                .map(|e| e.weighting * raw.get(&e.sub_impact).copied().unwrap_or(0.0))
                .sum();
            raw.insert(trigram.code().to_string(), value);
        }
        consumed.extend(entries.iter().map(|e| e.sub_impact.clone()));
    }
    for code in consumed {
        if code.parse::<Trigram>().is_err() {
            raw.remove(&code);
        }
    }
}

/// Keeps the trigram codes of `raw`; a trigram missing from it is zero.
pub fn to_impacts(raw: &RawImpacts) -> Impacts {
    let mut impacts = Impacts::zeroed();
    for (code, value) in raw {
        match code.parse::<Trigram>() {
            Ok(trigram) if !trigram.is_aggregate() => impacts.set(trigram, *value),
            Ok(_) => {}
            Err(_) => debug!(code = %code, "indicator outside the trigram set dropped"),
        }
    }
    impacts
}

/// `10^6 · Σ impact_t / norm[t] · weight[t]` over trigrams normalized in `aggregate`.
pub fn aggregate_score(impacts: &Impacts, definitions: &ImpactDefinitions, aggregate: Aggregate) -> f64 {
    Trigram::indicators()
        .filter_map(|t| {
            definitions
                .factors(aggregate, t)
                .map(|(normalization, weighting)| impacts.value(t) / normalization * weighting)
        })
        .sum::<f64>()
        * MICRO_POINTS
}

pub fn compute_aggregates(impacts: &mut Impacts, definitions: &ImpactDefinitions) {
    for aggregate in Aggregate::ALL {
        let score = aggregate_score(impacts, definitions, aggregate);
        impacts.set(aggregate.trigram(), score);
    }
}

/// The whole chain from raw indicator scores to a complete impact vector.
pub fn finalize(mut raw: RawImpacts, definitions: &ImpactDefinitions) -> Impacts {
    fold_split_indicators(&mut raw);
    apply_corrections(&mut raw, definitions);
    let mut impacts = to_impacts(&raw);
    compute_aggregates(&mut impacts, definitions);
    impacts
}
