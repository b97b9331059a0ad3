//! One export run: scope filtering, sequential resolution, parallel impact
//! computation, then the sequential ecosystemic-services pass and domain views.

pub mod builder;
pub mod runner;
pub mod views;

use crate::assembler;
use crate::catalog::Catalog;
use crate::ecosystemic::{self, EcosystemicInputs};
use crate::engine::ImpactEngine;
use crate::error::{ComputationError, EcoforgeError, OracleUnavailable, ResolutionError};
use crate::gateway::{Gateway, LocalBackend, MethodRegistry, OracleConfig, SimaProOracle};
use crate::lci::{Binding, LciStore, Resolver};
use crate::normalization::ImpactDefinitions;
use crate::report::{IssueKind, RunReport};
use ecoforge_schemas::activity::{Activity, Scope};
use ecoforge_schemas::ingredient::Ingredient;
use ecoforge_schemas::material::Material;
use ecoforge_schemas::process::{GenericProcess, Process};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{error, info, warn};

pub use builder::PipelineBuilder;

/// Everything a run produces, before anything is written.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Activities selected by the scope filter.
    pub activities: usize,
    pub processes: Vec<Process>,
    pub ingredients: Vec<Ingredient>,
    pub materials: Vec<Material>,
    pub generic: Vec<GenericProcess>,
    /// Number of processes computed by each backend.
    pub backends: BTreeMap<&'static str, usize>,
    pub report: RunReport,
}

struct Task<'c> {
    activity: &'c Activity,
    binding: Option<Binding>,
    wants_land_occupation: bool,
}

struct TaskOutput {
    process: Process,
    backend: &'static str,
    fallbacks: Vec<OracleUnavailable>,
    land_occupation: Result<Option<f64>, ComputationError>,
}

pub struct Pipeline {
    catalog: Catalog,
    definitions: ImpactDefinitions,
    store: LciStore,
    methods: MethodRegistry,
    method: String,
    land_occupation_method: Option<String>,
    ecosystemic: EcosystemicInputs,
    forest_complements: BTreeMap<String, f64>,
    oracle: Option<OracleConfig>,
    cpu_count: Option<usize>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs every stage for the activities whose scopes intersect `scopes` (all of
    /// them when `scopes` is empty).
    ///
    /// # Errors
    ///
    /// Only an activity naming an unknown LCI database stops the run; every other
    /// problem ends up in the output's report.
    pub fn run(&self, scopes: &[Scope]) -> Result<PipelineOutput, EcoforgeError> {
        let activities = self.catalog.filter(scopes);
        info!(activities = activities.len(), ?scopes, "starting run");

        let mut report = RunReport::new();
        let selected = activities.len();
        let tasks = self.resolve(activities, &mut report)?;

        let workers = runner::worker_count(self.cpu_count);
        info!(tasks = tasks.len(), workers, "computing impacts");
        let outcomes = runner::run_pool(
            &tasks,
            workers,
            || self.build_engine(),
            |engine, task| self.compute(engine, task),
        );

        let mut output = PipelineOutput {
            activities: selected,
            ..PipelineOutput::default()
        };
        let mut computed_land = HashMap::new();
        for (task, outcome) in tasks.iter().zip(outcomes) {
            let id = &task.activity.id;
            let result = outcome
                .map_err(|reason| ComputationError::WorkerPanicked(id.clone(), reason))
                .and_then(|result| result);
            match result {
                Ok(done) => {
                    for fallback in done.fallbacks {
                        report.push(IssueKind::OracleFallback, id, fallback.reason);
                    }
                    *output.backends.entry(done.backend).or_insert(0) += 1;
                    match done.land_occupation {
                        Ok(Some(value)) => {
                            computed_land.insert(id.clone(), value);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            report.integrity(id, format!("land occupation not computed: {err}"))
                        }
                    }
                    output.processes.push(done.process);
                }
                Err(err) => {
                    error!(activity = %id, %err, "impact computation failed");
                    report.push(IssueKind::Computation, id, err.to_string());
                }
            }
        }

        let computed: HashSet<String> = output.processes.iter().map(|p| p.id.clone()).collect();
        let done: Vec<&Activity> = tasks
            .iter()
            .map(|task| task.activity)
            .filter(|activity| computed.contains(&activity.id))
            .collect();
        self.build_views(&done, &computed_land, &mut output, &mut report);

        output.processes.sort_by(|a, b| a.id.cmp(&b.id));
        info!(
            processes = output.processes.len(),
            ingredients = output.ingredients.len(),
            materials = output.materials.len(),
            issues = report.entries().len(),
            "run complete"
        );
        output.report = report;
        Ok(output)
    }

    fn resolve<'c>(
        &'c self,
        activities: Vec<&'c Activity>,
        report: &mut RunReport,
    ) -> Result<Vec<Task<'c>>, ResolutionError> {
        let mut resolver = Resolver::new(&self.store);
        let mut tasks = Vec::with_capacity(activities.len());
        for activity in activities {
            let binding = match resolver.resolve(activity) {
                Ok(binding) => binding,
                Err(err @ ResolutionError::UnknownDatabase(_)) => return Err(err),
                Err(err) => {
                    error!(activity = %activity.id, %err, "resolution failed, activity dropped");
                    report.push(IssueKind::Resolution, &activity.id, err.to_string());
                    continue;
                }
            };
            if binding.is_none() && !activity.is_custom() {
                report.push(
                    IssueKind::Resolution,
                    &activity.id,
                    format!(
                        "no dataset matching '{}' in '{}'",
                        activity.activity_name, activity.source
                    ),
                );
                continue;
            }
            let wants_land_occupation = binding.is_some()
                && activity.is_ingredient()
                && activity
                    .metadata
                    .food
                    .as_ref()
                    .is_some_and(|food| food.land_occupation.is_none());
            tasks.push(Task {
                activity,
                binding,
                wants_land_occupation,
            });
        }
        Ok(tasks)
    }

    /// The per-worker engine: remote oracle first when configured, local backend last.
    fn build_engine(&self) -> ImpactEngine<'_> {
        let mut gateway = Gateway::new(&self.methods);
        if let Some(config) = &self.oracle {
            match SimaProOracle::new(config.clone()) {
                Ok(oracle) => gateway = gateway.with_backend(oracle),
                Err(unavailable) => {
                    warn!(reason = %unavailable.reason, "remote oracle disabled for this worker")
                }
            }
        }
        let gateway = gateway.with_backend(LocalBackend::new(&self.store));
        ImpactEngine::new(&self.store, &self.definitions, gateway, self.method.clone())
            .with_land_occupation_method(self.land_occupation_method.clone())
    }

    fn compute(
        &self,
        engine: &mut ImpactEngine<'_>,
        task: &Task<'_>,
    ) -> Result<TaskOutput, ComputationError> {
        let computed = engine.compute(task.activity, task.binding.as_ref())?;
        let dataset = task
            .binding
            .as_ref()
            .and_then(|binding| binding.dataset(&self.store));
        let process = assembler::assemble(task.activity, dataset, computed.impacts)?;
        let land_occupation = match (&task.binding, task.wants_land_occupation) {
            (Some(binding), true) => engine.land_occupation(binding),
            _ => Ok(None),
        };
        Ok(TaskOutput {
            process,
            backend: computed.backend,
            fallbacks: computed.fallbacks,
            land_occupation,
        })
    }

    fn build_views(
        &self,
        done: &[&Activity],
        computed_land: &HashMap<String, f64>,
        output: &mut PipelineOutput,
        report: &mut RunReport,
    ) {
        let ingredients: Vec<&Activity> = done
            .iter()
            .copied()
            .filter(|a| a.is_ingredient() && a.metadata.food.is_some())
            .collect();

        let mut land = HashMap::new();
        for id in ecosystemic::feed_closure(&ingredients, &self.ecosystemic.feed) {
            let Some(activity) = self.catalog.get(&id) else {
                continue;
            };
            if activity.metadata.food.is_none() {
                continue;
            }
            let computed = computed_land.get(&id).copied();
            if let Some(value) = ecosystemic::resolve_land_occupation(activity, computed, report) {
                land.insert(id, value);
            }
        }

        let (services, services_report) =
            ecosystemic::compute_services(&ingredients, &self.catalog, &self.ecosystemic, &land);
        report.extend(services_report);

        output.ingredients = ingredients
            .iter()
            .filter_map(|a| {
                views::ingredient(a, land.get(&a.id).copied(), services.get(&a.id).copied())
            })
            .collect();
        output.materials = done.iter().filter_map(|a| views::material(a)).collect();
        output.generic = done
            .iter()
            .flat_map(|a| views::generic_processes(a, &self.forest_complements, report))
            .collect();

        output.ingredients.sort_by(|a, b| a.id.cmp(&b.id));
        output.materials.sort_by(|a, b| a.id.cmp(&b.id));
        output.generic.sort_by(|a, b| a.id.cmp(&b.id));
    }
}
