use std::{env, path::PathBuf};

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeta_core::EvaluatorSettings;
use zeta_gpu::ComputeContext;

use parity_lab::{
    case_io::{export_case_sets_to_json, import_case_sets_from_json, CaseSet},
    cpu::{generate_zeta_cases, run_cpu_cases, zeta_stress_cases},
    report::{compare_outcomes, ParityReport},
    wgpu_zeta_runner::run_gpu_cases,
};

struct CliOptions {
    count: usize,
    seed: u64,
    tolerance: f64,
    oversampling: Option<u32>,
    input_json: Option<PathBuf>,
    export_json: Option<PathBuf>,
    skip_dispatch: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = parse_options()?;

    let case_sets = if let Some(ref path) = options.input_json {
        println!("Loading parity case sets from {}", path.display());
        import_case_sets_from_json(path)?
    } else {
        println!(
            "Generating parity cases (random count={}, seed=0x{:X})",
            options.count, options.seed
        );
        build_case_sets(options.count, options.seed)
    };

    if let Some(ref path) = options.export_json {
        export_case_sets_to_json(&case_sets, path)?;
        println!(
            "Exported {} case sets ({}) to {}",
            case_sets.len(),
            case_sets
                .iter()
                .map(|set| set.label())
                .collect::<Vec<_>>()
                .join(", "),
            path.display()
        );
    }

    if options.skip_dispatch {
        println!("Skip-dispatch flag set; exiting after case preparation.");
        return Ok(());
    }

    let mut settings = EvaluatorSettings::default();
    if let Some(oversampling) = options.oversampling {
        settings.oversampling = oversampling;
    }
    let context = ComputeContext::blocking_new(&settings).context("failed to set up the GPU")?;
    let plan = context.plan()?;
    println!(
        "Device '{}' ({:?}): batch size {}, {} terms, {} dispatches",
        context.adapter_info().name,
        context.adapter_info().backend,
        plan.batch_size,
        plan.term_count,
        plan.dispatch_count()
    );

    let mut failed = Vec::new();
    for set in &case_sets {
        println!("Running zeta set '{}' ({} cases)", set.label, set.cases.len());
        let cpu = run_cpu_cases(plan.clone(), &set.cases);
        let gpu = run_gpu_cases(&context, &set.cases)?;
        let report = compare_outcomes(&set.cases, &cpu, &gpu);
        print_report(set, &report, options.tolerance);
        if !report.within(options.tolerance) {
            failed.push(set.label.as_str());
        }
    }

    if !failed.is_empty() {
        bail!(
            "GPU results diverged beyond tolerance in: {}",
            failed.join(", ")
        );
    }
    Ok(())
}

fn parse_options() -> Result<CliOptions> {
    let mut opts = CliOptions {
        count: 128,
        seed: 0xA11CE,
        tolerance: 5e-3,
        oversampling: None,
        input_json: None,
        export_json: None,
        skip_dispatch: false,
    };

    for arg in env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--count=") {
            opts.count = value.parse().context("invalid --count value")?;
        } else if let Some(value) = arg.strip_prefix("--seed=") {
            opts.seed = parse_seed(value).context("invalid --seed value")?;
        } else if let Some(value) = arg.strip_prefix("--tolerance=") {
            opts.tolerance = value.parse().context("invalid --tolerance value")?;
        } else if let Some(value) = arg.strip_prefix("--oversampling=") {
            opts.oversampling = Some(value.parse().context("invalid --oversampling value")?);
        } else if let Some(value) = arg.strip_prefix("--cases-json=") {
            opts.input_json = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--export-json=") {
            opts.export_json = Some(PathBuf::from(value));
        } else if arg == "--skip-dispatch" {
            opts.skip_dispatch = true;
        } else {
            bail!("unrecognized argument: {arg}");
        }
    }

    Ok(opts)
}

fn print_report(set: &CaseSet, report: &ParityReport, tolerance: f64) {
    println!("Set '{}' residuals (tolerance={tolerance:.1e}):", set.label);
    println!("  compared              : {}", report.compared);
    println!("  max scaled |Δζ|       : {:.3e}", report.max_residual);
    println!("  matching error cases  : {}", report.agreed_errors);
    println!("  error mismatches      : {}", report.mismatches.len());
    if let Some((idx, case)) = report.worst {
        println!("  worst case #{idx}: s = {}", case.s());
    }
    for &idx in &report.mismatches {
        if let Some(case) = set.cases.get(idx) {
            println!("  mismatch #{idx}: s = {}", case.s());
        }
    }
}

fn build_case_sets(count: usize, seed: u64) -> Vec<CaseSet> {
    vec![
        CaseSet::new(
            format!("basic_random_0x{seed:X}"),
            generate_zeta_cases(count, seed),
        ),
        CaseSet::new("stress_edges", zeta_stress_cases()),
    ]
}

fn parse_seed(value: &str) -> Result<u64> {
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).context("expected hex literal")
    } else {
        value.parse().context("expected integer seed")
    }
}
