//! # Stepwise CLI
//!
//! Command-line front end for staircase estimates.
//!
//! ```text
//! stepwise calc stair.json --rates rates.json --pdf stair.pdf
//! stepwise estimate job.stw --json
//! stepwise init job.stw --estimator "Dana" --job 26-014
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stair_core::calculations::cut_list::{fmt_cm, format_waste_piece};
use stair_core::calculations::l_stair::{self, LStairInput, LStairResult};
use stair_core::calculations::{CalculationItem, StairMeasurements};
use stair_core::file_io::{self, read_json};
use stair_core::tasks::{ReferenceData, TaskRate, TaskRateTable};
use stair_core::{pdf, CalcError, EstimateFile, FileLock};

#[derive(Parser, Debug)]
#[command(name = "stepwise", version, about = "L-shaped staircase material and labor estimates")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(short, long, global = true, help = "Log per-step decisions to stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate a single staircase from an input JSON file
    Calc {
        input: PathBuf,
        #[arg(long, help = "Task-rate table (JSON)")]
        rates: Option<PathBuf>,
        #[arg(long, help = "Carrier table (JSON)")]
        carriers: Option<PathBuf>,
        #[arg(long, help = "Write a PDF report to this path")]
        pdf: Option<PathBuf>,
        #[arg(long, default_value = "")]
        estimator: String,
        #[arg(long, default_value = "")]
        job: String,
    },
    /// Estimate every staircase in a .stw file
    Estimate {
        file: PathBuf,
        #[arg(long, help = "Write a PDF report to this path")]
        pdf: Option<PathBuf>,
    },
    /// Write a sample estimate file
    Init {
        file: PathBuf,
        #[arg(long, default_value = "")]
        estimator: String,
        #[arg(long, default_value = "")]
        job: String,
        #[arg(long, default_value = "")]
        client: String,
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct ItemOut {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<LStairResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<CalcError>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Calc {
            input,
            rates,
            carriers,
            pdf,
            estimator,
            job,
        } => {
            let stair: LStairInput = read_json(&input)?;
            let mut reference = ReferenceData::default();
            if let Some(path) = rates {
                reference.task_rates = file_io::load_task_rates(&path)?;
            }
            if let Some(path) = carriers {
                reference.carriers = file_io::load_carriers(&path)?;
            }

            let result = match l_stair::calculate(&stair, &reference) {
                Ok(result) => result,
                Err(e) => return report_error(cli.json, e),
            };

            if let Some(out) = pdf {
                let bytes = pdf::render_stair_pdf(&stair, &result, &estimator, &job)?;
                write_pdf(&out, &bytes)?;
            }

            if cli.json {
                print_json(&result)?;
            } else {
                print_result(&stair.label, &result);
            }
        }
        Commands::Estimate { file, pdf } => {
            let (estimate, lock) = file_io::load_estimate_with_lock_check(&file)?;
            if let Some(lock) = lock {
                warn!(user = %lock.user_id, machine = %lock.machine, "estimate is open elsewhere, reading anyway");
            }

            let items: Vec<ItemOut> = estimate
                .calculate_all()
                .into_iter()
                .map(|(_, label, outcome)| match outcome {
                    Ok(result) => ItemOut {
                        label,
                        result: Some(result),
                        error: None,
                    },
                    Err(e) => ItemOut {
                        label,
                        result: None,
                        error: Some(e),
                    },
                })
                .collect();

            if let Some(out) = pdf {
                let bytes = pdf::render_estimate_pdf(&estimate)?;
                write_pdf(&out, &bytes)?;
            }

            if cli.json {
                print_json(&items)?;
            } else {
                println!(
                    "Job {} for {} ({} staircases)",
                    estimate.meta.job_id,
                    estimate.meta.client,
                    items.len()
                );
                for item in &items {
                    println!();
                    match (&item.result, &item.error) {
                        (Some(result), _) => print_result(&item.label, result),
                        (None, Some(e)) => println!("{}: [FAILED] {}", item.label, e),
                        (None, None) => {}
                    }
                }
            }
        }
        Commands::Init {
            file,
            estimator,
            job,
            client,
            force,
        } => {
            if file.exists() && !force {
                anyhow::bail!("{} already exists, use --force to overwrite", file.display());
            }
            let holder = if estimator.is_empty() { "stepwise".to_string() } else { estimator.clone() };
            let lock = FileLock::acquire(&file, holder)?;
            let estimate = sample_estimate(estimator, job, client);
            file_io::save_estimate(&estimate, lock.estimate_path())?;
            drop(lock);
            info!(path = %file.display(), "sample estimate written");
            if cli.json {
                print_json(&estimate)?;
            } else {
                println!("Wrote {}", file.display());
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins unless `-v` is given; the default is `warn`
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(json: bool, e: CalcError) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: false, data: &e })?
        );
    } else {
        eprintln!("Error [{}]: {}", e.error_code(), e);
    }
    std::process::exit(1);
}

fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&JsonOut { ok: true, data })?
    );
    Ok(())
}

fn write_pdf(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(())
}

fn print_result(label: &str, result: &LStairResult) {
    let g = &result.geometry;
    println!("═══════════════════════════════════════");
    println!("  {}", if label.is_empty() { "Staircase" } else { label });
    println!("═══════════════════════════════════════");
    println!();
    print!("{} steps of {} cm", g.step_count, fmt_cm(g.step_height_cm));
    if let Some(adj) = &g.height_adjustment {
        print!(" (adjusted from {} cm)", fmt_cm(adj.requested_cm));
    }
    println!();
    if let Some(d) = result.masonry.buried_depth_cm {
        println!("First course buried {} cm", fmt_cm(d));
    }
    println!();
    println!("Steps:");
    for (step, tally) in g.steps.iter().zip(&result.masonry.steps) {
        println!(
            "  {:>2}{} h={:<6} A {:>6}/{:<6} B {:>6}/{:<6} {} x{} joint {}{}",
            step.index + 1,
            if step.is_platform { "P" } else { " " },
            fmt_cm(step.target_height_cm),
            fmt_cm(step.arm_a_external_cm),
            fmt_cm(step.arm_a_inner_cm),
            fmt_cm(step.arm_b_external_cm),
            fmt_cm(step.arm_b_inner_cm),
            tally.unit,
            tally.courses,
            fmt_cm(tally.joint_thickness_cm),
            if tally.needs_cutting { " [CUT]" } else { "" },
        );
    }
    println!();
    println!("Materials:");
    for m in &result.materials {
        if m.unit == "pcs" {
            println!("  {:<28} {:>8} {}", m.name, m.amount.round(), m.unit);
        } else {
            println!("  {:<28} {:>8.1} {}", m.name, m.amount, m.unit);
        }
    }
    println!();
    println!("Cut list:");
    for line in result.cut_list_lines() {
        println!("  {}", line);
    }
    if !result.slabs.waste.is_empty() {
        println!();
        println!("Leftover offcuts:");
        for piece in &result.slabs.waste {
            println!("  {}", format_waste_piece(piece));
        }
    }
    if !result.tasks.is_empty() {
        println!();
        println!("Labor:");
        for t in &result.tasks {
            println!("  {:<40} {:>8.2} {:<6} {:>6.2} h", t.task, t.quantity, t.unit, t.hours);
        }
        println!("  {:<40} {:>23.2} h", "Total", result.total_hours);
    }
}

fn sample_estimate(estimator: String, job: String, client: String) -> EstimateFile {
    let mut estimate = EstimateFile::new(estimator, job, client);
    let rate = |name: &str, unit: &str, hours: f64| TaskRate {
        name: name.to_string(),
        unit: unit.to_string(),
        estimated_hours: hours,
    };
    estimate.reference.task_rates = TaskRateTable::new(vec![
        rate("Building steps with 7-inch block", "pcs", 0.2),
        rate("Building steps with 6-inch block", "pcs", 0.18),
        rate("Building steps with brick", "pcs", 0.05),
        rate("Cutting 30cm porcelain slab", "pcs", 0.1),
        rate("Cutting 60cm porcelain slab", "pcs", 0.15),
        rate("Tile installation 60x30", "pcs", 0.3),
        rate("Tile installation 30x30", "pcs", 0.2),
        rate("Mixing mortar", "batch", 0.5),
    ]);

    let measurements = StairMeasurements {
        total_rise_cm: 90.0,
        step_height_cm: 18.0,
        tread_depth_cm: 30.0,
        arm_a_length_cm: 150.0,
        arm_b_length_cm: 150.0,
        top_slab_thickness_cm: 2.0,
        front_slab_thickness_cm: 2.0,
        front_overhang_cm: 3.0,
    };
    let stair = estimate.new_stair("Front entrance", measurements);
    estimate.add_item(CalculationItem::LStair(stair));
    estimate
}
