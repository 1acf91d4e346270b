//! Data models for Slurm responses and configuration.
//!
//! This module provides the job snapshot types built from `squeue --json`,
//! the parsed `scontrol show job` record, and the configuration types.

mod config;
mod details;
mod job;
mod slurm_responses;
mod state;
mod time;

pub use config::{
    MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL, TuiConfig, is_valid_refresh_interval,
};
pub use details::JobDetails;
pub use job::{JobRecord, Placement};
pub use slurm_responses::{SlurmResponse, SqueueResponse};
pub use state::JobState;
