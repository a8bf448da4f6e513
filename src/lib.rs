//! Verifies that one SQLite store serves a read-write handle and several
//! read-only handles at the same time.
//!
//! A [`Runner`] executes registered [`Scenario`]s once per enabled [`Variant`].
//! Each run tracks its outstanding operations in a [`WaitGroup`] and reports
//! through a one-shot [`Completion`]; a run that does not complete within the
//! configured timeout is reported as timed out.
//!
//! ```no_run
//! use sqlite_parallel_verifier::{Runner, VerifierConfig};
//!
//! # async fn example() {
//! let report = Runner::with_default_scenarios(VerifierConfig::default())
//!    .run_all()
//!    .await;
//! assert!(report.is_success());
//! # }
//! ```

mod completion;
mod config;
mod error;
mod parallel_reader;
mod runner;
mod scenario;
mod variant;
mod wait_group;

pub use completion::{Completion, CompletionReceiver};
pub use config::VerifierConfig;
pub use error::{Error, Result};
pub use parallel_reader::{
   COLUMN, ParallelReaderScenario, STORE_NAME, TABLE, TEST_DATA, verify_parallel_readers,
};
pub use runner::{Outcome, Runner, ScenarioReport, SuiteReport};
pub use scenario::{Scenario, ScenarioContext, ScenarioFuture, ScenarioTasks};
pub use variant::{Variant, VariantSetting, default_settings};
pub use wait_group::{Pending, WaitGroup};
