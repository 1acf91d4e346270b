//! Interface to the Slurm command line tools
//!
//! Every interaction with the scheduler goes through [`SlurmInterface`]: the
//! job query (`squeue --json`), cancellation (`scancel`) and the detail query
//! (`scontrol show job`). Commands run as async child processes so the event
//! loop never blocks on a slow controller. Failures come back as
//! [`GatewayError`] and are logged here, at the boundary; callers decide how
//! to degrade.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::process::Command;

use crate::models::{JobDetails, JobRecord, SlurmResponse, SqueueResponse};

/// How the Slurm binary path was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResolution {
    /// Explicitly configured via config file or environment variable
    Configured,
    /// Auto-detected via PATH (found squeue in user's PATH)
    AutoDetected,
    /// Fell back to default /usr/bin and squeue was found there
    Fallback,
    /// Fell back to default /usr/bin but squeue was NOT found (likely misconfigured)
    FallbackUnverified,
}

/// Result of finding the Slurm binary path
#[derive(Debug, Clone)]
pub struct SlurmPathResult {
    pub path: PathBuf,
    pub resolution: PathResolution,
}

/// Find the directory containing Slurm binaries.
///
/// Resolution order:
/// 1. Explicit path provided (from config), if it is an existing directory.
/// 2. Auto-detect via PATH using the `which` crate to find `squeue`.
/// 3. Fallback to `/usr/bin`.
pub fn find_slurm_bin_path(config_path: Option<&Path>) -> SlurmPathResult {
    if let Some(path) = config_path {
        if path.is_dir() {
            return SlurmPathResult {
                path: path.to_path_buf(),
                resolution: PathResolution::Configured,
            };
        }
        tracing::warn!(
            path = %path.display(),
            "configured slurm_bin_path is not a directory, trying auto-detection"
        );
    }

    if let Ok(squeue_path) = which::which("squeue")
        && let Some(parent) = squeue_path.parent()
    {
        return SlurmPathResult {
            path: parent.to_path_buf(),
            resolution: PathResolution::AutoDetected,
        };
    }

    let fallback_path = PathBuf::from("/usr/bin");
    let resolution = if fallback_path.join("squeue").exists() {
        PathResolution::Fallback
    } else {
        PathResolution::FallbackUnverified
    };
    SlurmPathResult {
        path: fallback_path,
        resolution,
    }
}

/// Failure of a single scheduler command
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to execute {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with status {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("could not parse {command} output: {reason}")]
    Malformed { command: String, reason: String },

    #[error("{command} reported errors: {}", .messages.join("; "))]
    SchedulerErrors {
        command: String,
        messages: Vec<String>,
    },

    #[error("no job ids to act on")]
    NoTargets,
}

/// Slurm interface for calling squeue/scancel/scontrol
#[derive(Debug, Clone)]
pub struct SlurmInterface {
    /// Path to directory containing Slurm binaries
    pub slurm_bin_path: PathBuf,
    /// How the path was resolved (for diagnostics)
    resolution: PathResolution,
}

impl SlurmInterface {
    /// Create a new SlurmInterface using configuration.
    ///
    /// If the config specifies a slurm_bin_path, use it; otherwise auto-detect.
    pub fn with_config(config_path: Option<&Path>) -> Self {
        let result = find_slurm_bin_path(config_path);
        Self {
            slurm_bin_path: result.path,
            resolution: result.resolution,
        }
    }

    /// Use binaries from exactly this directory
    #[cfg(test)]
    pub fn at(path: &Path) -> Self {
        Self {
            slurm_bin_path: path.to_path_buf(),
            resolution: PathResolution::Configured,
        }
    }

    /// Check if the fallback path is unverified (squeue not found at /usr/bin)
    #[must_use]
    pub fn is_unverified_fallback(&self) -> bool {
        self.resolution == PathResolution::FallbackUnverified
    }

    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(self.slurm_bin_path.join(program));
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run a command to completion and return its stdout.
    async fn run(&self, mut cmd: Command, label: &str) -> Result<Vec<u8>, GatewayError> {
        let output = cmd.output().await.map_err(|source| GatewayError::Launch {
            command: label.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(GatewayError::NonZeroExit {
                command: label.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    /// Execute a Slurm command and parse the JSON response.
    ///
    /// Responses carrying a non-empty `errors` array are rejected even when
    /// the command exited successfully.
    async fn run_json<T>(&self, cmd: Command, label: &str) -> Result<T, GatewayError>
    where
        T: DeserializeOwned + SlurmResponse,
    {
        let stdout = self.run(cmd, label).await?;
        let response: T =
            serde_json::from_slice(&stdout).map_err(|e| GatewayError::Malformed {
                command: label.to_string(),
                reason: e.to_string(),
            })?;

        let messages = response.errors();
        if !messages.is_empty() {
            return Err(GatewayError::SchedulerErrors {
                command: label.to_string(),
                messages,
            });
        }

        Ok(response)
    }

    /// Query the jobs owned by `user`.
    pub async fn fetch_jobs(&self, user: &str) -> Result<Vec<JobRecord>, GatewayError> {
        let mut cmd = self.command("squeue");
        cmd.arg("-u").arg(user).arg("--json");

        let result = self
            .run_json::<SqueueResponse>(cmd, "squeue")
            .await
            .map(|response| {
                response
                    .jobs
                    .into_iter()
                    .map(JobRecord::from)
                    .filter(|job| !job.id.is_empty() && job.id != "0")
                    .collect()
            });

        if let Err(e) = &result {
            tracing::error!(user = user, error = %e, "job query failed");
        }
        result
    }

    /// Cancel the given jobs with a single `scancel` invocation.
    ///
    /// An empty id list is rejected without running anything.
    pub async fn cancel(&self, job_ids: &[String]) -> Result<(), GatewayError> {
        if job_ids.is_empty() {
            tracing::debug!("cancel requested with no job ids");
            return Err(GatewayError::NoTargets);
        }

        let mut cmd = self.command("scancel");
        cmd.args(job_ids);

        let result = self.run(cmd, "scancel").await.map(|_| ());
        if let Err(e) = &result {
            tracing::error!(job_ids = ?job_ids, error = %e, "job cancellation failed");
        }
        result
    }

    /// Fetch the full key/value record for one job.
    pub async fn fetch_details(&self, job_id: &str) -> Result<JobDetails, GatewayError> {
        let mut cmd = self.command("scontrol");
        cmd.arg("show").arg("job").arg(job_id);

        let result = match self.run(cmd, "scontrol").await {
            Ok(stdout) => JobDetails::parse(&String::from_utf8_lossy(&stdout)).map_err(|e| {
                GatewayError::Malformed {
                    command: "scontrol".to_string(),
                    reason: e.to_string(),
                }
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::error!(job_id = job_id, error = %e, "job detail query failed");
        }
        result
    }

    /// Check that `squeue` can be executed at all
    ///
    /// # Returns
    /// * `Ok(())` if `squeue --version` executes successfully
    /// * `Err(String)` describing why it could not be run
    pub async fn test_connection(&self) -> Result<(), String> {
        let squeue_path = self.slurm_bin_path.join("squeue");
        let mut cmd = self.command("squeue");
        cmd.arg("--version");

        match self.run(cmd, "squeue").await {
            Ok(_) => Ok(()),
            Err(GatewayError::Launch { source, .. }) => Err(match source.kind() {
                std::io::ErrorKind::NotFound => {
                    format!("squeue binary not found at '{}'", squeue_path.display())
                }
                std::io::ErrorKind::PermissionDenied => format!(
                    "permission denied when trying to execute '{}'",
                    squeue_path.display()
                ),
                _ => format!("failed to execute squeue: {source}"),
            }),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Get current username from environment
    pub fn get_current_user() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_else(|_| {
                tracing::warn!("could not determine username from USER or LOGNAME");
                "unknown".to_string()
            })
    }
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Fresh scratch directory unique to this process and test
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sktop-test-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Install an executable shell script standing in for a Slurm tool
    pub fn fake_tool(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }
}
