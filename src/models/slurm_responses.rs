//! Slurm API response wrappers.
//!
//! This module contains the wrapper types for deserializing `squeue --json`
//! output and the trait the gateway uses to surface scheduler-reported errors.

use serde::Deserialize;

use super::job::SqueueJob;

/// Trait for Slurm command responses that have an errors field.
///
/// Lets the generic JSON helper in `slurm.rs` reject responses whose
/// `errors` array is non-empty, independent of the concrete response type.
pub trait SlurmResponse {
    /// Human-readable errors reported by the Slurm command.
    fn errors(&self) -> Vec<String>;
}

/// One entry of a Slurm `errors` array.
///
/// Slurm 21.08 reports plain strings; later releases report objects with a
/// `description` and an `error` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SlurmMessage {
    Text(String),
    Detailed {
        #[serde(default)]
        description: String,
        #[serde(default)]
        error: String,
    },
}

impl SlurmMessage {
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            SlurmMessage::Text(s) => s.clone(),
            SlurmMessage::Detailed { description, error } => match (
                description.is_empty(),
                error.is_empty(),
            ) {
                (false, false) => format!("{}: {}", error, description),
                (false, true) => description.clone(),
                (true, _) => error.clone(),
            },
        }
    }
}

/// Slurm API response wrapper for squeue
#[derive(Debug, Deserialize)]
pub struct SqueueResponse {
    #[serde(default)]
    pub jobs: Vec<SqueueJob>,

    #[serde(default)]
    pub errors: Vec<SlurmMessage>,
}

impl SlurmResponse for SqueueResponse {
    fn errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(SlurmMessage::text)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
