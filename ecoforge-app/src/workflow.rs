use crate::config::{Config, KnowledgeBase};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ecoforge_core::export::{self, ExportSummary};
use ecoforge_core::pipeline::{Pipeline, PipelineOutput};
use ecoforge_core::report::IssueKind;
use ecoforge_schemas::activity::Scope;

/// Options of `export processes`.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub scopes: Vec<Scope>,
    pub cpu_count: Option<usize>,
    pub merge: bool,
    pub simapro: bool,
}

fn build_pipeline(config: &Config, cpu_count: Option<usize>, simapro: bool) -> Result<Pipeline> {
    let kb = KnowledgeBase::load(config)?;
    let oracle = if simapro { Some(config.oracle()?) } else { None };
    let pipeline = Pipeline::builder()
        .with_catalog(kb.catalog)
        .with_definitions(kb.definitions)
        .with_store(kb.store)
        .with_methods(kb.methods)
        .with_method(config.method.clone())
        .with_land_occupation_method(config.land_occupation_method.clone())
        .with_ecosystemic_inputs(kb.ecosystemic)
        .with_forest_complements(config.forest_complements.clone())
        .with_oracle(oracle)
        .with_cpu_count(cpu_count)
        .build()?;
    Ok(pipeline)
}

/// Computes every selected process and writes all artifacts to each output directory.
pub fn export_processes(config: &Config, options: &ExportOptions) -> Result<()> {
    println!("\n--- [Workflow] Exporting processes ---");
    let started = Utc::now();
    let pipeline = build_pipeline(config, options.cpu_count, options.simapro)?;
    let output = pipeline.run(&options.scopes)?;

    for dir in config.output_dirs() {
        let summary = export::export_processes(dir, &output, &options.scopes, options.merge)
            .with_context(|| format!("Failed to export processes to {:?}", dir))?;
        print_export(&summary);
    }
    finish(config, &output, started)
}

/// Runs the pipeline but writes only the ingredient, material and generic process views.
pub fn export_metadata(config: &Config, scopes: &[Scope]) -> Result<()> {
    println!("\n--- [Workflow] Exporting metadata ---");
    let started = Utc::now();
    let pipeline = build_pipeline(config, None, false)?;
    let output = pipeline.run(scopes)?;

    for dir in config.output_dirs() {
        let summary = export::export_metadata(dir, &output, scopes)
            .with_context(|| format!("Failed to export metadata to {:?}", dir))?;
        print_export(&summary);
    }
    finish(config, &output, started)
}

fn print_export(summary: &ExportSummary) {
    println!("\nWritten to {}:", summary.directory.display());
    for path in &summary.written {
        if let Some(name) = path.file_name() {
            println!("  - {}", name.to_string_lossy());
        }
    }
    match &summary.diff {
        Some(diff) => {
            println!("\nChanges since the previous export:");
            print!("{}", diff.render_table());
        }
        None => println!("\nNo previous export to compare with."),
    }
}

fn finish(config: &Config, output: &PipelineOutput, started: DateTime<Utc>) -> Result<()> {
    let report = &output.report;
    let backends = output
        .backends
        .iter()
        .map(|(name, count)| format!("{name}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    println!("\n\n--- [Run Summary] ---");
    println!("========================================");
    println!("Started:            {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Duration:           {:.1} s", (Utc::now() - started).num_milliseconds() as f64 / 1000.0);
    println!("Activities:         {}", output.activities);
    println!("Processes:          {} ({})", output.processes.len(), backends);
    println!("Ingredients:        {}", output.ingredients.len());
    println!("Materials:          {}", output.materials.len());
    println!("Generic processes:  {}", output.generic.len());
    println!("----------------------------------------");
    println!(
        "Issues: {} resolution, {} computation, {} oracle fallback, {} integrity",
        report.count(IssueKind::Resolution),
        report.count(IssueKind::Computation),
        report.count(IssueKind::OracleFallback),
        report.count(IssueKind::Integrity)
    );
    print!("{}", report.render_table());
    println!("========================================");

    if let Some(path) = &config.report_csv {
        report
            .write_csv(&path.to_string_lossy())
            .with_context(|| format!("Failed to write run report to {:?}", path))?;
        println!("Run report written to {}", path.display());
    }
    Ok(())
}
