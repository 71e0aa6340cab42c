//! Command-line front end for the zeta evaluator.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeta_core::{
    strip::grow_strip, BackendKind, Complex, CpuPartialSum, EvaluatorSettings, PartialSumBackend,
    ZetaEvaluator,
};
use zeta_gpu::{ComputeContext, GpuPartialSum};

mod cli;

use cli::{Cli, Commands};

type Evaluator<'ctx> = ZetaEvaluator<Box<dyn PartialSumBackend + 'ctx>>;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let context = match settings.backend {
        BackendKind::Gpu => Some(
            ComputeContext::blocking_new(&settings)
                .context("failed to initialise the GPU backend (pass --cpu to use the host)")?,
        ),
        BackendKind::Cpu => None,
    };
    let backend: Box<dyn PartialSumBackend + '_> = match &context {
        Some(context) => Box::new(GpuPartialSum::new(context)?),
        None => Box::new(CpuPartialSum::from_settings(&settings)?),
    };
    let evaluator = ZetaEvaluator::new(backend);
    info!(
        backend = ?settings.backend,
        term_count = evaluator.backend().plan().term_count,
        "evaluator ready"
    );

    match cli.command {
        Commands::Eval { re, im, json } => eval(&evaluator, Complex::new(re, im), json),
        Commands::Strip { rows, export } => strip(&evaluator, &settings, rows, export.as_deref()),
    }
}

/// `RUST_LOG` directives when present and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn resolve_settings(cli: &Cli) -> Result<EvaluatorSettings> {
    let mut settings = match &cli.settings {
        Some(path) => EvaluatorSettings::load(path)?,
        None => EvaluatorSettings::default(),
    };
    if let Some(oversampling) = cli.oversampling {
        settings.oversampling = oversampling;
    }
    if cli.cpu {
        settings.backend = BackendKind::Cpu;
    }
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn eval(evaluator: &Evaluator<'_>, s: Complex, json: bool) -> Result<()> {
    let value = evaluator
        .zeta(s)
        .with_context(|| format!("failed to evaluate zeta({s})"))?;

    if json {
        let record = serde_json::json!({ "s": s, "zeta": value, "abs": value.abs() });
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("zeta({s}) = {value}");
        println!("|zeta| = {:.9e}", value.abs());
    }
    Ok(())
}

fn strip(
    evaluator: &Evaluator<'_>,
    settings: &EvaluatorSettings,
    rows: Option<usize>,
    export: Option<&Path>,
) -> Result<()> {
    let mesh = grow_strip(evaluator, &settings.strip, rows).context("strip sampling failed")?;
    println!(
        "rows: {}  vertices: {}  triangles: {}",
        mesh.rows(),
        mesh.vertices.len(),
        mesh.indices.len() / 3
    );

    if let Some(path) = export {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &mesh)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("mesh written to {}", path.display());
    }
    Ok(())
}
