use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx_sqlite_handle::StoreConfig;

use crate::Result;
use crate::variant::{Variant, VariantSetting, default_settings};

/// Verifier configuration.
///
/// Every field is optional in the JSON form; missing fields take their defaults.
///
/// ```
/// use sqlite_parallel_verifier::{Variant, VerifierConfig};
///
/// let config = VerifierConfig::from_json_str(r#"{ "timeout_ms": 500 }"#).unwrap();
/// assert_eq!(config.timeout().as_millis(), 500);
/// assert!(config.is_enabled(Variant::Default));
/// assert!(!config.is_enabled(Variant::Implementation2));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
   /// Directory that holds the store files
   ///
   /// Default: `sqlite-parallel-verifier` under the system temp directory
   pub location: PathBuf,

   /// Per-scenario completion timeout in milliseconds
   ///
   /// Default: 12000
   pub timeout_ms: u64,

   /// Default: 6
   pub max_read_connections: u32,

   /// Default: 30
   pub idle_timeout_secs: u64,

   /// Default: 5000
   pub busy_timeout_ms: u64,

   /// Variants in run order
   ///
   /// Default: `default` enabled, `implementation-2` disabled
   pub variants: Vec<VariantSetting>,
}

impl Default for VerifierConfig {
   fn default() -> Self {
      let store = StoreConfig::default();
      Self {
         location: std::env::temp_dir().join("sqlite-parallel-verifier"),
         timeout_ms: Self::DEFAULT_TIMEOUT_MS,
         max_read_connections: store.max_read_connections,
         idle_timeout_secs: store.idle_timeout.as_secs(),
         busy_timeout_ms: u64::try_from(store.busy_timeout.as_millis()).unwrap_or(u64::MAX),
         variants: default_settings(),
      }
   }
}

impl VerifierConfig {
   pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;
   pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(Self::DEFAULT_TIMEOUT_MS);

   pub fn from_json_str(json: &str) -> Result<Self> {
      Ok(serde_json::from_str(json)?)
   }

   pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
      let json = std::fs::read_to_string(path)?;
      Self::from_json_str(&json)
   }

   pub fn timeout(&self) -> Duration {
      Duration::from_millis(self.timeout_ms)
   }

   /// Store configuration for a variant: pool limits from this config, journal
   /// mode from the variant.
   pub fn store_config(&self, variant: Variant) -> StoreConfig {
      StoreConfig {
         max_read_connections: self.max_read_connections,
         idle_timeout: Duration::from_secs(self.idle_timeout_secs),
         busy_timeout: Duration::from_millis(self.busy_timeout_ms),
         journal_mode: variant.journal_mode(),
      }
   }

   pub fn is_enabled(&self, variant: Variant) -> bool {
      self
         .variants
         .iter()
         .any(|setting| setting.variant == variant && setting.enabled)
   }

   /// Enable or disable a variant, appending it if it is not listed.
   pub fn set_enabled(&mut self, variant: Variant, enabled: bool) {
      match self.variants.iter_mut().find(|s| s.variant == variant) {
         Some(setting) => setting.enabled = enabled,
         None => self.variants.push(VariantSetting { variant, enabled }),
      }
   }
}
