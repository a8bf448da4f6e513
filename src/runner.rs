use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::completion::Completion;
use crate::config::VerifierConfig;
use crate::parallel_reader::ParallelReaderScenario;
use crate::scenario::{Scenario, ScenarioContext};
use crate::variant::Variant;
use crate::wait_group::WaitGroup;
use crate::{Error, Result};

/// How a scenario run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
   Passed,
   Failed { code: String, message: String },
   TimedOut { after_ms: u64 },
   /// The variant is disabled; the scenario body never ran.
   Skipped,
}

impl Outcome {
   fn from_result(result: Result<()>) -> Self {
      match result {
         Ok(()) => Outcome::Passed,
         Err(Error::TimedOut(after)) => Outcome::TimedOut {
            after_ms: millis(after),
         },
         Err(e) => Outcome::Failed {
            code: e.error_code(),
            message: e.to_string(),
         },
      }
   }

   pub fn label(&self) -> &'static str {
      match self {
         Outcome::Passed => "PASS",
         Outcome::Failed { .. } => "FAIL",
         Outcome::TimedOut { .. } => "TIMEOUT",
         Outcome::Skipped => "SKIP",
      }
   }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
   pub suite: String,
   pub description: String,
   pub variant: Variant,
   pub outcome: Outcome,
   pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
   pub run_id: Uuid,
   pub reports: Vec<ScenarioReport>,
}

impl SuiteReport {
   pub fn passed(&self) -> usize {
      self.count(|o| matches!(o, Outcome::Passed))
   }

   /// Failed and timed-out runs.
   pub fn failed(&self) -> usize {
      self.count(|o| matches!(o, Outcome::Failed { .. } | Outcome::TimedOut { .. }))
   }

   pub fn skipped(&self) -> usize {
      self.count(|o| matches!(o, Outcome::Skipped))
   }

   pub fn is_success(&self) -> bool {
      self.failed() == 0
   }

   fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
      self.reports.iter().filter(|r| pred(&r.outcome)).count()
   }
}

/// Runs registered scenarios once per configured variant.
///
/// Each run is spawned on its own task. The task awaits the scenario body,
/// then waits for every operation the body dispatched, then signals a
/// [`Completion`]. The runner waits on that signal for at most the configured
/// timeout and aborts the task if it expires. Tasks the scenario spawned
/// through its context are aborted when the run ends either way.
pub struct Runner {
   config: VerifierConfig,
   scenarios: Vec<Arc<dyn Scenario>>,
}

impl Runner {
   pub fn new(config: VerifierConfig) -> Self {
      Self {
         config,
         scenarios: Vec::new(),
      }
   }

   /// Runner with the parallel reader scenario registered.
   pub fn with_default_scenarios(config: VerifierConfig) -> Self {
      Self::new(config).register(ParallelReaderScenario::default())
   }

   pub fn register(mut self, scenario: impl Scenario + 'static) -> Self {
      self.scenarios.push(Arc::new(scenario));
      self
   }

   pub fn config(&self) -> &VerifierConfig {
      &self.config
   }

   /// Run every scenario for every configured variant, in order.
   pub async fn run_all(&self) -> SuiteReport {
      let run_id = Uuid::new_v4();
      let mut reports = Vec::new();

      for setting in &self.config.variants {
         for scenario in &self.scenarios {
            if !setting.enabled {
               debug!(
                  scenario = scenario.description(),
                  variant = %setting.variant,
                  "Skipping disabled variant"
               );
               reports.push(report(scenario.as_ref(), setting.variant, Outcome::Skipped, 0));
               continue;
            }

            reports.push(self.run_scenario(setting.variant, Arc::clone(scenario)).await);
         }
      }

      SuiteReport { run_id, reports }
   }

   /// Run one scenario for one variant, regardless of whether the variant is enabled.
   pub async fn run_scenario(&self, variant: Variant, scenario: Arc<dyn Scenario>) -> ScenarioReport {
      let started = Instant::now();
      let wait_group = WaitGroup::new();
      let ctx = ScenarioContext::new(
         variant,
         self.config.location.clone(),
         self.config.store_config(variant),
         wait_group.clone(),
      );

      let tasks = ctx.tasks().clone();

      debug!(scenario = scenario.description(), variant = %variant, "Running scenario");

      let (completion, receiver) = Completion::channel();
      let body = scenario.run(ctx);
      let task = tokio::spawn(async move {
         let result = body.await;
         wait_group.wait().await;
         completion.signal(result);
      });

      let timeout = self.config.timeout();
      let result = match tokio::time::timeout(timeout, receiver.wait()).await {
         Ok(result) => result,
         Err(_) => {
            task.abort();
            Err(Error::TimedOut(timeout))
         }
      };

      let aborted = tasks.abort_all();
      if aborted > 0 {
         debug!(scenario = scenario.description(), aborted, "Aborted leftover scenario tasks");
      }

      let elapsed_ms = millis(started.elapsed());
      if let Err(e) = &result {
         warn!(
            scenario = scenario.description(),
            variant = %variant,
            elapsed_ms,
            error = %e,
            "Scenario failed"
         );
      }

      report(scenario.as_ref(), variant, Outcome::from_result(result), elapsed_ms)
   }
}

fn millis(duration: Duration) -> u64 {
   u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn report(scenario: &dyn Scenario, variant: Variant, outcome: Outcome, elapsed_ms: u64) -> ScenarioReport {
   ScenarioReport {
      suite: format!("{}: {}", variant.label(), scenario.suite()),
      description: scenario.description().to_string(),
      variant,
      outcome,
      elapsed_ms,
   }
}
