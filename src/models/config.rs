//! Configuration types.
//!
//! Settings are layered: built-in defaults, `/etc/sktop/config.toml`, the
//! user's config file, `SKTOP_*` environment variables and finally command
//! line flags (applied by `main`). Invalid values fall back to defaults with a
//! warning shown in the status bar, unless `SKTOP_STRICT_CONFIG` is set.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TuiConfig {
    pub system: SystemConfig,

    pub refresh: RefreshConfig,

    pub display: DisplayConfig,

    pub behavior: BehaviorConfig,

    pub logging: LoggingConfig,

    pub logs: LogViewConfig,
}

/// System configuration for paths and environment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Path to directory containing Slurm binaries (squeue, scancel, scontrol)
    /// If empty or not set, auto-detected via PATH
    pub slurm_bin_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between automatic refresh cycles
    pub interval: f64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval: 5.0 }
    }
}

/// Minimum allowed refresh interval in seconds (prevents tight polling loops)
pub const MIN_REFRESH_INTERVAL: f64 = 0.5;

/// Maximum allowed refresh interval in seconds (one day)
pub const MAX_REFRESH_INTERVAL: f64 = 86_400.0;

/// True for intervals the refresh timer accepts. NaN and infinities are rejected.
#[must_use]
pub fn is_valid_refresh_interval(secs: f64) -> bool {
    (MIN_REFRESH_INTERVAL..=MAX_REFRESH_INTERVAL).contains(&secs)
}

impl RefreshConfig {
    /// Validate refresh configuration values.
    /// Returns a list of warnings for invalid values that were corrected to defaults.
    /// If `strict` is true, returns Err instead of correcting values.
    pub fn validate(&mut self, strict: bool) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        let default = Self::default().interval;

        if !is_valid_refresh_interval(self.interval) {
            let msg = format!(
                "refresh.interval must be between {MIN_REFRESH_INTERVAL} and {MAX_REFRESH_INTERVAL} second(s), got {}",
                self.interval
            );
            if strict {
                return Err(msg);
            }
            warnings.push(format!("{msg} - using default ({default})"));
            self.interval = default;
        }

        Ok(warnings)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Theme name
    pub theme: String,

    /// Maximum length for job names before truncation
    pub name_max_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            name_max_length: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Require confirmation before cancelling jobs
    pub confirm_cancel: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            confirm_cancel: true,
        }
    }
}

/// Diagnostics log file settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// File that internal failures are appended to
    pub file: PathBuf,

    /// tracing filter directive (overridden by SKTOP_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("sktop.log"),
            level: "error".to_string(),
        }
    }
}

/// Log tail view settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogViewConfig {
    /// Lines of history `tail` prints before following
    pub initial_lines: usize,

    /// Lines kept in the log view before the oldest are discarded
    pub max_lines: usize,
}

impl Default for LogViewConfig {
    fn default() -> Self {
        Self {
            initial_lines: 100,
            max_lines: 5000,
        }
    }
}

impl LogViewConfig {
    fn validate(&mut self, strict: bool) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        let defaults = Self::default();

        if self.max_lines == 0 {
            let msg = "logs.max_lines must be at least 1".to_string();
            if strict {
                return Err(msg);
            }
            warnings.push(format!("{msg} - using default ({})", defaults.max_lines));
            self.max_lines = defaults.max_lines;
        }

        Ok(warnings)
    }
}

impl TuiConfig {
    /// Get the user config file path, respecting XDG_CONFIG_HOME
    ///
    /// Resolution order:
    /// 1. $XDG_CONFIG_HOME/sktop/config.toml (if XDG_CONFIG_HOME is set)
    /// 2. $HOME/.config/sktop/config.toml (if HOME is set)
    /// 3. dirs::config_dir()/sktop/config.toml (fallback using dirs crate)
    /// 4. None if no config directory can be determined
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return Some(PathBuf::from(xdg_config).join("sktop/config.toml"));
        }

        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config/sktop/config.toml"));
        }

        dirs::config_dir().map(|dir| dir.join("sktop/config.toml"))
    }

    /// Load configuration from files and environment.
    ///
    /// Returns the config and any warnings encountered during loading. In
    /// strict mode (`SKTOP_STRICT_CONFIG=1`) the first problem is an error.
    pub fn load() -> Result<(Self, Vec<String>)> {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        let strict = Self::is_strict_mode();

        Self::load_config_file(&mut config, "/etc/sktop/config.toml", strict, &mut warnings)?;

        if let Some(user_path) = Self::user_config_path() {
            Self::load_config_file(
                &mut config,
                &user_path.to_string_lossy(),
                strict,
                &mut warnings,
            )?;
        }

        config.apply_env_overrides(|name| std::env::var(name).ok(), strict, &mut warnings)?;
        config.validate(strict, &mut warnings)?;

        Ok((config, warnings))
    }

    /// Run all section validators, collecting warnings
    pub fn validate(&mut self, strict: bool, warnings: &mut Vec<String>) -> Result<()> {
        let results = [self.refresh.validate(strict), self.logs.validate(strict)];
        for result in results {
            match result {
                Ok(found) => warnings.extend(found),
                Err(err) => bail!("{err} (SKTOP_STRICT_CONFIG is set - config errors are fatal)"),
            }
        }
        Ok(())
    }

    /// Check if strict config mode is enabled via SKTOP_STRICT_CONFIG
    fn is_strict_mode() -> bool {
        std::env::var("SKTOP_STRICT_CONFIG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Load a config file, collecting warnings on parse errors but not on missing files.
    fn load_config_file(
        config: &mut Self,
        path: &str,
        strict: bool,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<TuiConfig>(&content) {
                Ok(parsed) => config.merge(parsed),
                Err(e) => {
                    let msg = format!("Config parse error in '{}': {}", path, e);
                    if strict {
                        bail!("{msg} (SKTOP_STRICT_CONFIG is set - config errors are fatal)");
                    }
                    warnings.push(msg);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let msg = format!("Could not read config '{}': {}", path, e);
                if strict {
                    bail!("{msg} (SKTOP_STRICT_CONFIG is set - config errors are fatal)");
                }
                warnings.push(msg);
            }
        }
        Ok(())
    }

    fn merge(&mut self, other: TuiConfig) {
        // Prefer other's slurm_bin_path if set, otherwise keep current
        self.system.slurm_bin_path = other
            .system
            .slurm_bin_path
            .or(self.system.slurm_bin_path.take());
        self.refresh = other.refresh;
        self.display = other.display;
        self.behavior = other.behavior;
        self.logging = other.logging;
        self.logs = other.logs;
    }

    /// Apply `SKTOP_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(
        &mut self,
        lookup: F,
        strict: bool,
        warnings: &mut Vec<String>,
    ) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SKTOP_SLURM_PATH")
            && !val.is_empty()
        {
            let path = PathBuf::from(&val);
            if path.is_dir() {
                self.system.slurm_bin_path = Some(path);
            } else {
                Self::report_env_error(
                    strict,
                    warnings,
                    "SKTOP_SLURM_PATH",
                    &val,
                    "not a valid directory",
                )?;
            }
        }

        if let Some(val) = lookup("SKTOP_REFRESH") {
            match val.parse::<f64>() {
                Ok(secs) if is_valid_refresh_interval(secs) => {
                    self.refresh.interval = secs;
                }
                Ok(_) => Self::report_env_error(
                    strict,
                    warnings,
                    "SKTOP_REFRESH",
                    &val,
                    &format!(
                        "must be between {} and {} second(s)",
                        MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL
                    ),
                )?,
                Err(_) => Self::report_env_error(
                    strict,
                    warnings,
                    "SKTOP_REFRESH",
                    &val,
                    "expected a number of seconds",
                )?,
            }
        }

        if let Some(val) = lookup("SKTOP_THEME") {
            self.display.theme = val;
        }
        if let Some(val) = lookup("SKTOP_LOG_FILE")
            && !val.is_empty()
        {
            self.logging.file = PathBuf::from(val);
        }

        Ok(())
    }

    /// Report an environment variable error, failing if strict mode is enabled
    fn report_env_error(
        strict: bool,
        warnings: &mut Vec<String>,
        var_name: &str,
        value: &str,
        reason: &str,
    ) -> Result<()> {
        if strict {
            bail!(
                "Invalid value '{}' for {}: {} (SKTOP_STRICT_CONFIG is set - config errors are fatal)",
                value,
                var_name,
                reason
            );
        }
        warnings.push(format!(
            "Invalid value '{}' for {}, {} - using default",
            value, var_name, reason
        ));
        Ok(())
    }
}
