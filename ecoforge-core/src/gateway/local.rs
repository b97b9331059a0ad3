use super::{ImpactBackend, ImpactRequest};
use crate::error::{BackendError, ComputationError};
use crate::lci::{LciDatabase, LciStore};
use ecoforge_schemas::impacts::RawImpacts;
use ecoforge_schemas::lci::Exchange;
use ecoforge_schemas::method::Method;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

const PIVOT_EPSILON: f64 = 1e-12;

/// Elementary flow totals keyed by `(flow, compartment)`.
type Inventory = BTreeMap<(String, Option<String>), f64>;

/// Computes impacts in-process: life-cycle inventory over the technosphere reachable
/// from the demanded dataset, then characterization under the requested method.
///
/// Inventories are cached per (dataset, demand), so switching method on the same
/// dataset does not solve the system again.
pub struct LocalBackend<'a> {
    store: &'a LciStore,
    inventories: HashMap<(String, String, u64), Inventory>,
}

impl<'a> LocalBackend<'a> {
    pub fn new(store: &'a LciStore) -> Self {
        Self {
            store,
            inventories: HashMap::new(),
        }
    }

    fn inventory(
        &mut self,
        database: &str,
        code: &str,
        demand: f64,
    ) -> Result<&Inventory, ComputationError> {
        let key = (database.to_string(), code.to_string(), demand.to_bits());
        if !self.inventories.contains_key(&key) {
            let db = self.store.database(database).ok_or_else(|| {
                ComputationError::UnknownDataset {
                    database: database.to_string(),
                    code: code.to_string(),
                }
            })?;
            let inventory = life_cycle_inventory(db, code, demand)?;
            self.inventories.insert(key.clone(), inventory);
        }
        Ok(&self.inventories[&key])
    }
}

impl ImpactBackend for LocalBackend<'_> {
    fn name(&self) -> &'static str {
        "local"
    }

    fn impacts(&mut self, request: &ImpactRequest<'_>) -> Result<RawImpacts, BackendError> {
        let inventory = self.inventory(request.database, &request.dataset.code, request.demand)?;
        Ok(characterize(inventory, request.method))
    }
}

/// Solves `A·s = f` on the sub-graph reachable from `code` and returns `B·s`.
/// `A` is stored sparse, so memory follows the number of exchanges, not n².
pub fn life_cycle_inventory(
    db: &LciDatabase,
    code: &str,
    demand: f64,
) -> Result<Inventory, ComputationError> {
    let order = reachable(db, code)?;
    let index: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let n = order.len();

    let mut matrix = SparseMatrix::new(n);
    for (j, activity_code) in order.iter().enumerate() {
        let dataset = db.get(activity_code).ok_or_else(|| ComputationError::UnknownDataset {
            database: db.name().to_string(),
            code: activity_code.clone(),
        })?;
        matrix.add(j, j, dataset.production_amount);
        for exchange in &dataset.exchanges {
            if let Exchange::Technosphere { input, amount } = exchange {
                matrix.add(index[input.as_str()], j, -amount);
            }
        }
    }

    let mut rhs = vec![0.0; n];
    rhs[0] = demand;
    let supply = matrix
        .solve(rhs)
        .ok_or_else(|| ComputationError::SingularMatrix(code.to_string()))?;

    let mut inventory = Inventory::new();
    for (j, activity_code) in order.iter().enumerate() {
        if supply[j] == 0.0 {
            continue;
        }
        if let Some(dataset) = db.get(activity_code) {
            for exchange in &dataset.exchanges {
                if let Exchange::Biosphere {
                    flow,
                    compartment,
                    amount,
                } = exchange
                {
                    *inventory
                        .entry((flow.clone(), compartment.clone()))
                        .or_insert(0.0) += amount * supply[j];
                }
            }
        }
    }
    Ok(inventory)
}

/// Dataset codes reachable through technosphere inputs, the demanded one first.
fn reachable(db: &LciDatabase, code: &str) -> Result<Vec<String>, ComputationError> {
    if db.get(code).is_none() {
        return Err(ComputationError::UnknownDataset {
            database: db.name().to_string(),
            code: code.to_string(),
        });
    }
    let mut order = vec![code.to_string()];
    let mut seen: HashSet<String> = HashSet::from([code.to_string()]);
    let mut queue = VecDeque::from([code.to_string()]);

    while let Some(current) = queue.pop_front() {
        let dataset = db.get(&current).ok_or_else(|| ComputationError::UnknownDataset {
            database: db.name().to_string(),
            code: current.clone(),
        })?;
        for exchange in &dataset.exchanges {
            if let Exchange::Technosphere { input, .. } = exchange {
                if db.get(input).is_none() {
                    return Err(ComputationError::MissingInput {
                        dataset: dataset.name.clone(),
                        input: input.clone(),
                    });
                }
                if seen.insert(input.clone()) {
                    order.push(input.clone());
                    queue.push_back(input.clone());
                }
            }
        }
    }
    Ok(order)
}

/// Technosphere matrix holding only its non-zero entries, indexed both by row and
/// by column.
struct SparseMatrix {
    rows: Vec<BTreeMap<usize, f64>>,
    columns: Vec<BTreeSet<usize>>,
}

impl SparseMatrix {
    fn new(n: usize) -> Self {
        Self {
            rows: vec![BTreeMap::new(); n],
            columns: vec![BTreeSet::new(); n],
        }
    }

    fn add(&mut self, row: usize, col: usize, value: f64) {
        let current = self.rows[row].get(&col).copied().unwrap_or(0.0);
        self.set(row, col, current + value);
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        if value == 0.0 {
            self.rows[row].remove(&col);
            self.columns[col].remove(&row);
        } else {
            self.rows[row].insert(col, value);
            self.columns[col].insert(row);
        }
    }

    /// Gaussian elimination with partial pivoting. Rows are never moved: each column
    /// records the row it was pivoted on. `None` when the matrix is singular.
    fn solve(mut self, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
        let n = rhs.len();
        let mut used = vec![false; n];
        let mut pivots = Vec::with_capacity(n);

        for col in 0..n {
            let pivot = self.columns[col]
                .iter()
                .copied()
                .filter(|&r| !used[r])
                .max_by(|&a, &b| {
                    self.rows[a][&col]
                        .abs()
                        .partial_cmp(&self.rows[b][&col].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })?;
            let pivot_value = self.rows[pivot][&col];
            if pivot_value.abs() < PIVOT_EPSILON {
                return None;
            }
            used[pivot] = true;
            pivots.push(pivot);

            let pivot_row = self.rows[pivot].clone();
            let targets: Vec<usize> = self.columns[col]
                .iter()
                .copied()
                .filter(|&r| !used[r])
                .collect();
            for row in targets {
                let factor = self.rows[row][&col] / pivot_value;
                for (&k, &value) in &pivot_row {
                    if k == col {
                        self.set(row, col, 0.0);
                    } else {
                        self.add(row, k, -factor * value);
                    }
                }
                rhs[row] -= factor * rhs[pivot];
            }
        }

        let mut solution = vec![0.0; n];
        for col in (0..n).rev() {
            let row = &self.rows[pivots[col]];
            let tail: f64 = row
                .range(col + 1..)
                .map(|(&k, &value)| value * solution[k])
                .sum();
            solution[col] = (rhs[pivots[col]] - tail) / row[&col];
        }
        Some(solution)
    }
}

/// Scores every indicator of `method` on an inventory. A factor without compartment
/// applies to the flow in any compartment.
pub fn characterize(inventory: &Inventory, method: &Method) -> RawImpacts {
    let mut impacts = RawImpacts::new();
    for indicator in &method.indicators {
        let mut score = 0.0;
        for ((flow, compartment), amount) in inventory {
            let factor = indicator.factors.iter().find(|f| {
                &f.flow == flow
                    && (f.compartment.is_none() || f.compartment.as_ref() == compartment.as_ref())
            });
            if let Some(factor) = factor {
                score += factor.value * amount;
            }
        }
        *impacts.entry(indicator.code.clone()).or_insert(0.0) += score;
    }
    impacts
}
