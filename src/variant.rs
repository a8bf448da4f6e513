//! Implementation variants a scenario can run against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx_sqlite_handle::JournalMode;

/// Store implementation variant.
///
/// Variants are chosen explicitly through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
   /// WAL journaling: readers and the writer never block each other.
   #[serde(rename = "default")]
   Default,
   /// Rollback journal with file locking, on a store file of its own.
   #[serde(rename = "implementation-2")]
   Implementation2,
}

impl Variant {
   pub const ALL: [Variant; 2] = [Variant::Default, Variant::Implementation2];

   pub fn label(self) -> &'static str {
      match self {
         Variant::Default => "default",
         Variant::Implementation2 => "implementation-2",
      }
   }

   pub fn journal_mode(self) -> JournalMode {
      match self {
         Variant::Default => JournalMode::Wal,
         Variant::Implementation2 => JournalMode::Delete,
      }
   }

   /// Store name used by this variant for a scenario's base name.
   ///
   /// `Implementation2` prefixes `i2-` so it never opens a file another
   /// variant already switched to WAL.
   pub fn store_name(self, base: &str) -> String {
      match self {
         Variant::Default => base.to_string(),
         Variant::Implementation2 => format!("i2-{base}"),
      }
   }
}

impl fmt::Display for Variant {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.label())
   }
}

impl FromStr for Variant {
   type Err = String;

   fn from_str(s: &str) -> Result<Self, Self::Err> {
      Variant::ALL
         .into_iter()
         .find(|variant| variant.label() == s)
         .ok_or_else(|| {
            format!(
               "unknown variant '{s}' (expected one of: {})",
               Variant::ALL.map(Variant::label).join(", ")
            )
         })
   }
}

/// A variant and whether its scenarios run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSetting {
   pub variant: Variant,
   pub enabled: bool,
}

/// Default variant list: `Default` runs, `Implementation2` is registered but disabled.
pub fn default_settings() -> Vec<VariantSetting> {
   vec![
      VariantSetting {
         variant: Variant::Default,
         enabled: true,
      },
      VariantSetting {
         variant: Variant::Implementation2,
         enabled: false,
      },
   ]
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_store_names_do_not_collide() {
      assert_eq!(Variant::Default.store_name("a.db"), "a.db");
      assert_eq!(Variant::Implementation2.store_name("a.db"), "i2-a.db");
   }

   #[test]
   fn test_parse_labels() {
      for variant in Variant::ALL {
         assert_eq!(variant.label().parse::<Variant>(), Ok(variant));
      }

      let err = "android".parse::<Variant>().unwrap_err();
      assert!(err.contains("implementation-2"));
   }

   #[test]
   fn test_serde_uses_labels() {
      let json = serde_json::to_string(&Variant::Implementation2).unwrap();
      assert_eq!(json, "\"implementation-2\"");
   }

   #[test]
   fn test_second_variant_disabled_by_default() {
      let settings = default_settings();
      assert_eq!(settings.len(), 2);
      assert!(settings[0].enabled);
      assert!(!settings[1].enabled);
      assert_eq!(settings[1].variant.journal_mode(), JournalMode::Delete);
   }
}
