//! # Settings
//!
//! Layered, later layers win:
//!
//! | Layer | Source |
//! |-------|--------|
//! | 1 | Built-in defaults |
//! | 2 | TOML file: `--config`, else `AWSCMD_CONFIG`, else `./awscmd.toml` if present |
//! | 3 | Environment: `AWS_REGION` / `AWS_DEFAULT_REGION`, `AWS_PROFILE`, `AWSCMD_CONFIRM_IMPACT`, `AWSCMD_LOG` |
//! | 4 | Command-line flags |
//!
//! ```toml
//! region = "eu-west-1"
//! profile = "ops"
//! confirm_impact = "high"
//! log = "info"
//! ```

use anyhow::{Context, Result};
use cmdlet_framework::{Ambient, ConfirmImpact, CredentialRef, Region};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "AWSCMD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "./awscmd.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid value '{value}' in {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Region used when a command does not name one.
    pub region: Option<String>,
    /// Credential profile forwarded to the client factory.
    pub profile: String,
    /// Operations at or above this impact ask for confirmation.
    pub confirm_impact: ConfirmImpact,
    /// Default tracing directive when `RUST_LOG` is unset.
    pub log: String,
    /// Account id used in local queue URLs.
    pub local_account_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: None,
            profile: "default".to_string(),
            confirm_impact: ConfirmImpact::Medium,
            log: "warn".to_string(),
            local_account_id: "000000000000".to_string(),
        }
    }
}

/// File contents. Every key is optional so a file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    region: Option<String>,
    profile: Option<String>,
    confirm_impact: Option<ConfirmImpact>,
    log: Option<String>,
    local_account_id: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub confirm_impact: Option<ConfirmImpact>,
    pub log: Option<String>,
}

/// Environment lookup, swappable in tests.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Settings {
    /// Builds settings from every layer.
    pub fn load(
        config_path: Option<&Path>,
        env: &dyn EnvSource,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(path) = config_file(config_path, env) {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            settings
                .merge_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        }

        settings.apply_env(env)?;
        settings.apply_overrides(overrides);
        settings.validate()?;
        Ok(settings)
    }

    fn merge_toml(&mut self, content: &str) -> Result<(), toml::de::Error> {
        let file: FileSettings = toml::from_str(content)?;
        if file.region.is_some() {
            self.region = file.region;
        }
        if let Some(profile) = file.profile {
            self.profile = profile;
        }
        if let Some(impact) = file.confirm_impact {
            self.confirm_impact = impact;
        }
        if let Some(log) = file.log {
            self.log = log;
        }
        if let Some(account) = file.local_account_id {
            self.local_account_id = account;
        }
        Ok(())
    }

    fn apply_env(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        if let Some(region) = env.get("AWS_REGION").or_else(|| env.get("AWS_DEFAULT_REGION")) {
            self.region = Some(region);
        }
        if let Some(profile) = env.get("AWS_PROFILE") {
            self.profile = profile;
        }
        if let Some(value) = env.get("AWSCMD_CONFIRM_IMPACT") {
            self.confirm_impact =
                value
                    .parse::<ConfirmImpact>()
                    .map_err(|e| ConfigError::InvalidEnv {
                        key: "AWSCMD_CONFIRM_IMPACT",
                        value: value.clone(),
                        reason: e.to_string(),
                    })?;
        }
        if let Some(log) = env.get("AWSCMD_LOG") {
            self.log = log;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if overrides.region.is_some() {
            self.region = overrides.region.clone();
        }
        if let Some(profile) = &overrides.profile {
            self.profile = profile.clone();
        }
        if let Some(impact) = overrides.confirm_impact {
            self.confirm_impact = impact;
        }
        if let Some(log) = &overrides.log {
            self.log = log.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(ConfigError::Empty("region"));
        }
        if self.profile.trim().is_empty() {
            return Err(ConfigError::Empty("profile"));
        }
        if self.local_account_id.trim().is_empty() {
            return Err(ConfigError::Empty("local_account_id"));
        }
        Ok(())
    }

    /// Region and credential reference for the invocation context.
    pub fn ambient(&self) -> Ambient {
        Ambient {
            region: self.region.as_deref().map(Region::new),
            credentials: CredentialRef::profile(self.profile.clone()),
        }
    }
}

fn config_file(explicit: Option<&Path>, env: &dyn EnvSource) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.get(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    default.exists().then(|| default.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> MapEnv {
        MapEnv(pairs.iter().copied().collect())
    }

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "awscmd-{}-{}.toml",
            name,
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.region, None);
        assert_eq!(settings.profile, "default");
        assert_eq!(settings.confirm_impact, ConfirmImpact::Medium);
        assert_eq!(settings.log, "warn");
    }

    #[test]
    fn test_layers_apply_in_order() {
        let path = temp_config(
            "layers",
            "region = \"eu-west-1\"\nprofile = \"file\"\nconfirm_impact = \"high\"\n",
        );
        let environment = env(&[("AWS_PROFILE", "env"), ("AWSCMD_LOG", "debug")]);
        let overrides = Overrides {
            profile: Some("cli".into()),
            ..Default::default()
        };

        let settings = Settings::load(Some(&path), &environment, &overrides).unwrap();
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.profile, "cli");
        assert_eq!(settings.confirm_impact, ConfirmImpact::High);
        assert_eq!(settings.log, "debug");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_aws_region_wins_over_default_region() {
        let environment = env(&[
            ("AWS_DEFAULT_REGION", "us-west-2"),
            ("AWS_REGION", "ap-south-1"),
            (CONFIG_ENV, "/nonexistent/awscmd.toml"),
        ]);
        // An explicit path that does not exist is an error, not a silent skip.
        assert!(Settings::load(None, &environment, &Overrides::default()).is_err());

        let environment = env(&[("AWS_DEFAULT_REGION", "us-west-2"), ("AWS_REGION", "ap-south-1")]);
        let path = temp_config("empty", "");
        let settings = Settings::load(Some(&path), &environment, &Overrides::default()).unwrap();
        assert_eq!(settings.region.as_deref(), Some("ap-south-1"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_env_impact_is_reported() {
        let path = temp_config("impact", "");
        let environment = env(&[("AWSCMD_CONFIRM_IMPACT", "severe")]);
        let err = Settings::load(Some(&path), &environment, &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("AWSCMD_CONFIRM_IMPACT"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        let path = temp_config("unknown", "regoin = \"eu-west-1\"\n");
        let err = Settings::load(Some(&path), &env(&[]), &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_empty_region_rejected() {
        let settings = Settings {
            region: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::Empty("region")));
    }

    #[test]
    fn test_ambient_carries_region_and_profile() {
        let settings = Settings {
            region: Some("us-east-1".into()),
            profile: "ops".into(),
            ..Default::default()
        };
        let ambient = settings.ambient();
        assert_eq!(ambient.region, Some(Region::new("us-east-1")));
        assert_eq!(ambient.credentials, CredentialRef::profile("ops"));
    }
}
