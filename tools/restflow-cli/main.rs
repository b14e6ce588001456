use clap::{Parser, Subcommand};
use restflow::error::PipelineError;
use restflow::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Infers and verifies data-flow dependencies between REST API operations
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract operations and candidate dependencies, then write reports
    Analyze {
        /// Path to the API description (YAML or JSON)
        #[arg(long)]
        spec: PathBuf,
        /// Output directory for reports
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
    /// Analyze, then verify the candidates against a running service
    Refine {
        /// Path to the API description (YAML or JSON)
        #[arg(long)]
        spec: PathBuf,
        /// Base URL of the REST service
        #[arg(long, default_value = "http://localhost:3000")]
        base: String,
        /// Output directory for reports
        #[arg(long, default_value = "output")]
        out: PathBuf,
        /// Maximum refinement iterations
        #[arg(long, default_value_t = 5)]
        max_iterations: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { spec, out } => run_analyze(&spec, &out),
        Command::Refine {
            spec,
            base,
            out,
            max_iterations,
        } => run_refine(&spec, &base, &out, max_iterations).await,
    }
}

fn run_analyze(spec: &Path, out: &Path) {
    let analysis = analyze_or_exit(spec);
    let output_dir = output_dir(out, spec);

    let report = analysis.report().with_spec_path(spec.display().to_string());
    write_reports(&output_dir, &report)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write reports: {}", e)));

    println!(
        "Extracted {} operations and {} dependencies.",
        analysis.operations().len(),
        analysis.dependencies().len()
    );
    println!("Reports written to {}", output_dir.display());
}

async fn run_refine(spec: &Path, base: &str, out: &Path, max_iterations: usize) {
    let config = RefineConfig::builder(base)
        .with_max_iterations(max_iterations)
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid refinement settings: {}", e)));
    let analysis = analyze_or_exit(spec);
    let output_dir = output_dir(out, spec);

    println!(
        "Refining {} dependencies against {}",
        analysis.dependencies().len(),
        config.base_url
    );
    let outcome = analysis.refine(&ReqwestTransport::new(), &config).await;
    let verified = outcome.verified_count();
    let total = outcome.dependencies.len();
    let changed = outcome.changes().iter().filter(|c| c.changed()).count();

    let report = analysis
        .report()
        .with_spec_path(spec.display().to_string())
        .with_refinement(outcome);
    write_reports(&output_dir, &report)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write reports: {}", e)));

    println!("Verified {}/{} dependencies.", verified, total);
    println!("Changed {}/{} dependencies after refinement.", changed, total);
    println!(
        "Refinement diff written to {}",
        output_dir.join(restflow::report::REFINEMENT_DIFF_FILE).display()
    );
}

fn analyze_or_exit(spec: &Path) -> Analysis {
    match Pipeline::from_path(spec) {
        Ok(analysis) => analysis,
        Err(PipelineError::Validation(failure)) => {
            for message in &failure.errors {
                eprintln!("Validation error: {}", message);
            }
            std::process::exit(1);
        }
        Err(e) => exit_with_error(&format!("Failed to analyze '{}': {}", spec.display(), e)),
    }
}

/// `<out>/<slug>-<YYYYMMDD-HHMMSS>`.
fn output_dir(out: &Path, spec: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    out.join(format!("{}-{}", app_slug(spec), timestamp))
}

/// The description file's parent directory name, unless that is generic, else the file stem.
fn app_slug(spec: &Path) -> String {
    let dir_name = spec
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if !dir_name.is_empty() && !matches!(dir_name, "." | "src" | "resources") {
        return dir_name.to_string();
    }
    spec.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spec")
        .to_string()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
