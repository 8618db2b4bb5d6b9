//! Server configuration.
//!
//! [`ServeConfig`] is built once at startup from the resolved options and is
//! read-only afterwards. Every component receives it explicitly (usually
//! behind an `Arc`); nothing reads serving options from global state.

use crate::config::ServeOptions;
use crate::error::{CliError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File served by the single-page fallback when none is named.
pub const DEFAULT_FALLBACK: &str = "index.html";

/// Quiet period after the last filesystem change before a reload is sent.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Single-page application fallback setting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SinglePage {
    /// Unresolved paths are 404
    #[default]
    Disabled,
    /// Unresolved paths serve `index.html`
    Index,
    /// Unresolved paths serve this file, relative to the base directory
    File(String),
}

impl SinglePage {
    /// Parse a `--single` value: `true` (or empty) selects the default
    /// fallback, `false` disables it, anything else names the file.
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        match value.trim() {
            "" | "true" => Ok(SinglePage::Index),
            "false" => Ok(SinglePage::Disabled),
            file => Ok(SinglePage::File(file.trim_start_matches('/').to_string())),
        }
    }

    /// Name of the file to fall back to, if the fallback is enabled.
    pub fn fallback_file(&self) -> Option<&str> {
        match self {
            SinglePage::Disabled => None,
            SinglePage::Index => Some(DEFAULT_FALLBACK),
            SinglePage::File(file) => Some(file),
        }
    }
}

/// Serialized form of [`SinglePage`]: a boolean or a file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleSetting {
    Flag(bool),
    File(String),
}

impl From<SingleSetting> for SinglePage {
    fn from(setting: SingleSetting) -> Self {
        match setting {
            SingleSetting::Flag(true) => SinglePage::Index,
            SingleSetting::Flag(false) => SinglePage::Disabled,
            SingleSetting::File(file) => {
                SinglePage::parse(&file).unwrap_or(SinglePage::Disabled)
            }
        }
    }
}

impl From<&SinglePage> for SingleSetting {
    fn from(single: &SinglePage) -> Self {
        match single {
            SinglePage::Disabled => SingleSetting::Flag(false),
            SinglePage::Index => SingleSetting::Flag(true),
            SinglePage::File(file) => SingleSetting::File(file.clone()),
        }
    }
}

/// Immutable per-process serving configuration.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Entry point as given (canonicalized)
    pub entry: PathBuf,

    /// Directory files are served from
    pub base_dir: PathBuf,

    /// The entry file, when the entry point is a single file
    pub entry_file: Option<PathBuf>,

    /// Process working directory, used for listing titles
    pub cwd: PathBuf,

    /// Bind host
    pub host: String,

    /// Requested port (a free one is picked if taken)
    pub port: u16,

    /// Add permissive CORS headers to every response
    pub cors: bool,

    /// Suppress startup and access logging
    pub quiet: bool,

    /// Print one line per request
    pub log_requests: bool,

    /// Single-page application fallback
    pub single: SinglePage,

    /// Preview mode: live reload disabled
    pub preview: bool,
}

impl ServeConfig {
    /// Build the configuration for `entry` with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::FileNotFound`] if the entry point doesn't exist.
    pub fn new(entry: &Path, options: &ServeOptions) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let entry = if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            cwd.join(entry)
        };
        let entry = entry.canonicalize().with_path(&entry)?;

        let (base_dir, entry_file) = if entry.is_file() {
            let parent = entry
                .parent()
                .ok_or_else(|| CliError::InvalidArgument(format!(
                    "Entry file has no parent directory: {}",
                    entry.display()
                )))?
                .to_path_buf();
            (parent, Some(entry.clone()))
        } else {
            (entry.clone(), None)
        };

        Ok(Self {
            entry,
            base_dir,
            entry_file,
            cwd,
            host: options.host.clone(),
            port: options.port,
            cors: options.cors,
            quiet: options.quiet,
            log_requests: options.logs && !options.quiet,
            single: options.single.clone().into(),
            preview: options.preview,
        })
    }

    /// Whether the reload script is injected and the watcher runs.
    pub fn reload_enabled(&self) -> bool {
        !self.preview
    }

    /// Path of the configured single-page fallback file, if enabled.
    pub fn fallback_path(&self) -> Option<PathBuf> {
        self.single
            .fallback_file()
            .map(|file| self.base_dir.join(file))
    }
}
