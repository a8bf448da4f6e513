use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sqlite_parallel_verifier::{
   Error, Outcome, Result, Runner, SuiteReport, Variant, VerifierConfig,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Check that one SQLite store serves a writer and parallel read-only handles.
#[derive(Debug, Parser)]
#[command(name = "parallel-verifier", version)]
struct Cli {
   /// Directory that holds the store files
   #[arg(long)]
   location: Option<PathBuf>,

   /// JSON configuration file
   #[arg(long)]
   config: Option<PathBuf>,

   /// Per-scenario timeout in milliseconds
   #[arg(long)]
   timeout_ms: Option<u64>,

   /// Enable a variant (repeatable): default, implementation-2
   #[arg(long = "enable", value_name = "VARIANT")]
   enable: Vec<Variant>,

   /// Print the report as JSON
   #[arg(long)]
   json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
      .with_writer(std::io::stderr)
      .init();

   match run(Cli::parse()).await {
      Ok(true) => ExitCode::SUCCESS,
      Ok(false) => ExitCode::FAILURE,
      Err(e) => {
         error!(code = %e.error_code(), "{e}");
         ExitCode::FAILURE
      }
   }
}

async fn run(cli: Cli) -> Result<bool> {
   let mut config = match &cli.config {
      Some(path) => VerifierConfig::from_file(path)?,
      None => VerifierConfig::default(),
   };

   if let Some(location) = cli.location {
      config.location = location;
   }
   if let Some(timeout_ms) = cli.timeout_ms {
      config.timeout_ms = timeout_ms;
   }
   for variant in cli.enable {
      config.set_enabled(variant, true);
   }

   info!(location = %config.location.display(), timeout_ms = config.timeout_ms, "Starting verification");

   let report = Runner::with_default_scenarios(config).run_all().await;
   sqlx_sqlite_handle::close_all().await;

   if cli.json {
      let json = serde_json::to_string_pretty(&report).map_err(Error::Report)?;
      println!("{json}");
   } else {
      print_report(&report);
   }

   Ok(report.is_success())
}

fn print_report(report: &SuiteReport) {
   for entry in &report.reports {
      println!(
         "{:<7} {}: {} ({} ms)",
         entry.outcome.label(),
         entry.suite,
         entry.description,
         entry.elapsed_ms
      );
      match &entry.outcome {
         Outcome::Failed { code, message } => println!("        [{code}] {message}"),
         Outcome::TimedOut { after_ms } => println!("        no completion after {after_ms} ms"),
         Outcome::Passed | Outcome::Skipped => {}
      }
   }

   println!(
      "{} passed, {} failed, {} skipped",
      report.passed(),
      report.failed(),
      report.skipped()
   );
}
