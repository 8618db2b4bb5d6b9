//! Layered option loading.
//!
//! Options come from several sources, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. `hotview.json` in the working directory (or the `--config` file)
//! 3. `HOTVIEW_*` environment variables (e.g. `HOTVIEW_PORT=9000`)
//! 4. Command-line flags that were actually given

use crate::cli::Cli;
use crate::error::{ConfigError, Result};
use crate::serve::config::SingleSetting;
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "hotview.json";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "HOTVIEW_";

/// Serving options after all sources are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub cors: bool,
    pub quiet: bool,
    pub logs: bool,
    pub single: SingleSetting,
    pub preview: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors: false,
            quiet: false,
            logs: false,
            single: SingleSetting::Flag(false),
            preview: false,
        }
    }
}

/// Flags given on the command line. Unset flags are skipped so they don't
/// mask lower-priority sources.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quiet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    single: Option<SingleSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<bool>,
}

impl From<&Cli> for CliOverrides {
    fn from(args: &Cli) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            cors: args.cors.then_some(true),
            quiet: args.quiet.then_some(true),
            logs: args.logs.then_some(true),
            single: args.single.as_ref().map(SingleSetting::from),
            preview: args.preview.then_some(true),
        }
    }
}

impl ServeOptions {
    /// Load options from all sources.
    ///
    /// `cwd` is where `hotview.json` is looked up when `--config` isn't given.
    pub fn load(args: &Cli, cwd: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match &args.config {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.clone()).into());
            }
            Some(path) => Some(path.clone()),
            None => {
                let default_path = cwd.join(CONFIG_FILE);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!("Loading options from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));
        figment = figment.merge(Serialized::defaults(CliOverrides::from(args)));

        figment.extract().map_err(|e| {
            ConfigError::InvalidValue {
                field: e.path.join("."),
                value: e.kind.to_string(),
                hint: "Check hotview.json and HOTVIEW_* variables for typos and types".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests;
