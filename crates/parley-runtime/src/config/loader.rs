//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables `parley.toml`
//! - `yaml-config`: enables `parley.yaml` / `parley.yml`
//!
//! Both can be enabled at once; each format is searched independently.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults (the schema's serde defaults)
//! 2. Profile-specific config file (`parley.{profile}.toml` / `parley.{profile}.yaml`)
//! 3. Main config file (`parley.toml` / `parley.yaml`)
//! 4. Environment variables (`PARLEY_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Variables use the `PARLEY_` prefix with `__` as the nesting separator:
//!
//! - `PARLEY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `PARLEY_ENGINE__PROCESS_WHEN_CLOSED=true` → `engine.process_when_closed = true`
//! - `PARLEY_ENGINE__HOST_SETTINGS__BOT_ID=abc` → `engine.host_settings.bot_id = "abc"`
//!
//! # Key Aliases
//!
//! Engine keys may be spelled `processWhenClosed`, `handleBotEvents` and so
//! on. Each layer is rewritten to the canonical snake_case keys before it is
//! merged, so a file using an alias can still be overridden by the
//! environment or by [`ConfigLoader::set`].
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./parley.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::value::{Dict, Map, Value};
use figment::{Figment, Metadata, Provider};
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use parley_framework::ENGINE_KEY_ALIASES;

use super::schema::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PARLEY_";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "PARLEY_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the short forms `dev` and `prod`.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `PARLEY_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layer whose aliased `engine` keys are renamed to their canonical names.
struct CanonicalKeys<P>(P);

impl<P: Provider> Provider for CanonicalKeys<P> {
    fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    fn data(&self) -> figment::Result<Map<figment::Profile, Dict>> {
        let mut data = self.0.data()?;
        for dict in data.values_mut() {
            if let Some(Value::Dict(_, engine)) = dict.get_mut("engine") {
                canonicalize_engine_keys(engine);
            }
        }
        Ok(data)
    }

    fn profile(&self) -> Option<figment::Profile> {
        self.0.profile()
    }
}

fn canonicalize_engine_keys(engine: &mut Dict) {
    for (alias, canonical) in ENGINE_KEY_ALIASES {
        let Some(value) = engine.remove(*alias) else {
            continue;
        };
        if engine.contains_key(*canonical) {
            warn!(alias, canonical, "Engine key given twice, keeping the canonical spelling");
        } else {
            engine.insert((*canonical).to_string(), value);
        }
    }
}

/// Layered configuration loader.
pub struct ConfigLoader {
    /// Programmatic overrides.
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (skips the search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<user config dir>/parley` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(config_dir) => self.search_path(config_dir.join("parley")),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a full configuration as the highest-priority layer.
    pub fn merge(mut self, config: RuntimeConfig) -> Self {
        self.figment = self
            .figment
            .merge(CanonicalKeys(Serialized::defaults(config)));
        self
    }

    /// Sets a single value as the highest-priority layer, e.g.
    /// `.set("logging.level", "debug")`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.figment = self
            .figment
            .merge(CanonicalKeys(Serialized::default(key, value)));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> RuntimeResult<RuntimeConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: RuntimeConfig = figment.extract().map_err(|e| {
            RuntimeError::Parse(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            rules = config.rules.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> RuntimeResult<Figment> {
        // Defaults come from the schema's serde defaults.
        let mut figment = Figment::new();

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(RuntimeError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(CanonicalKeys(
                Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"),
            ));
        }

        // Programmatic overrides win over everything else.
        let overrides = std::mem::take(&mut self.figment);
        Ok(figment.merge(overrides))
    }

    /// Merges a single file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> RuntimeResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(CanonicalKeys(Toml::file(path)))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(CanonicalKeys(Yaml::file(path)))),
            _ => Err(RuntimeError::Parse(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("parley"));
        }
        paths
    }

    /// Searches `search_paths × base_names`. A profile-specific variant is
    /// merged before its base file; the first base file found ends the search.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }

    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["parley.toml"],
                |fig, path| fig.merge(CanonicalKeys(Toml::file(path))),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["parley.yaml", "parley.yml"],
                |fig, path| fig.merge(CanonicalKeys(Yaml::file(path))),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> RuntimeResult<RuntimeConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> RuntimeResult<RuntimeConfig> {
    ConfigLoader::new().file(path).load()
}
