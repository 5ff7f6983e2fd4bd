//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use bf_core::{Plan, SubjectId, Subscription, ValidationError};
use chrono::{DateTime, FixedOffset};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// The tracked infant.
    pub subject: String,
    /// Subscription plan.
    pub plan: Plan,
    /// When a premium plan lapses. Absent means it does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_expires_at: Option<DateTime<FixedOffset>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("subject", &self.subject)
            .field("plan", &self.plan)
            .field("premium_expires_at", &self.premium_expires_at)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("babyflow.db"),
            subject: "default".to_string(),
            plan: Plan::Free,
            premium_expires_at: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BF_*)
        figment = figment.merge(Env::prefixed("BF_"));

        figment.extract()
    }

    /// The configured subject as a validated ID.
    pub fn subject_id(&self) -> Result<SubjectId, ValidationError> {
        SubjectId::new(self.subject.clone())
    }

    pub const fn subscription(&self) -> Subscription {
        Subscription {
            plan: self.plan,
            expires_at: self.premium_expires_at,
        }
    }
}

/// Returns the platform-specific config directory for babyflow.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("babyflow"))
}

/// Returns the platform-specific data directory for babyflow.
///
/// On Linux: `~/.local/share/babyflow`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("babyflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_babyflow() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "babyflow");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("babyflow.db"));
        assert_eq!(config.subject, "default");
        assert_eq!(config.plan, Plan::Free);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
database_path = "/tmp/other.db"
subject = "ana"
plan = "premium"
premium_expires_at = "2030-01-01T00:00:00Z"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.subject_id().unwrap().as_str(), "ana");
        assert_eq!(config.plan, Plan::Premium);
        assert!(config.premium_expires_at.is_some());
    }

    #[test]
    fn test_invalid_plan_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "plan = \"gold\"\n").unwrap();
        assert!(Config::load_from(Some(&path)).is_err());
    }
}
