//! Refresh scheduling for the job table
//!
//! A refresh cycle is Idle -> Fetching -> Merging -> Idle. Exclusivity is a
//! single-permit semaphore: the permit is acquired when a cycle starts, rides
//! along with the fetched snapshot inside a [`RefreshTicket`], and is released
//! when the event loop drops the ticket after merging. Timer and manual
//! triggers are no-ops while a cycle holds the permit; forced cycles (after a
//! successful cancel) wait for it instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::slurm::SlurmInterface;
use crate::tui::event::DataEvent;

/// What started a refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCause {
    Timer,
    Manual,
    Forced,
}

/// Proof that a refresh cycle owns the engine until the ticket is dropped
#[derive(Debug)]
pub struct RefreshTicket {
    cause: RefreshCause,
    started: Instant,
    _permit: OwnedSemaphorePermit,
}

impl RefreshTicket {
    #[must_use]
    pub fn cause(&self) -> RefreshCause {
        self.cause
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Starts refresh cycles and delivers their snapshots to the event loop
#[derive(Debug, Clone)]
pub struct Reconciler {
    permit: Arc<Semaphore>,
    slurm: SlurmInterface,
    user: String,
    tx: mpsc::Sender<DataEvent>,
}

impl Reconciler {
    pub fn new(slurm: SlurmInterface, user: String, tx: mpsc::Sender<DataEvent>) -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
            slurm,
            user,
            tx,
        }
    }

    /// True when no cycle is fetching or waiting to be merged
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.permit.available_permits() > 0
    }

    /// Start a cycle unless one is already in flight.
    ///
    /// Returns `false` (and does nothing) when the engine is busy.
    pub fn trigger(&self, cause: RefreshCause) -> bool {
        match Arc::clone(&self.permit).try_acquire_owned() {
            Ok(permit) => {
                let ticket = RefreshTicket {
                    cause,
                    started: Instant::now(),
                    _permit: permit,
                };
                let this = self.clone();
                tokio::spawn(async move { this.fetch(ticket).await });
                true
            }
            Err(_) => {
                tracing::debug!(?cause, "refresh already in flight, skipping");
                false
            }
        }
    }

    /// Run a cycle as soon as the current one (if any) has been merged.
    pub fn force(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let Ok(permit) = Arc::clone(&this.permit).acquire_owned().await else {
                return;
            };
            let ticket = RefreshTicket {
                cause: RefreshCause::Forced,
                started: Instant::now(),
                _permit: permit,
            };
            this.fetch(ticket).await;
        })
    }

    async fn fetch(&self, ticket: RefreshTicket) {
        let result = self.slurm.fetch_jobs(&self.user).await;
        tracing::debug!(
            cause = ?ticket.cause,
            elapsed_ms = ticket.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "refresh fetched"
        );
        // A closed channel drops the ticket here, which returns the engine to idle
        let _ = self.tx.send(DataEvent::JobsFetched { ticket, result }).await;
    }
}

/// Spawn the periodic refresh timer. The first tick fires immediately and
/// performs the initial load.
pub fn spawn_refresh_timer(
    reconciler: Reconciler,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    reconciler.trigger(RefreshCause::Timer);
                }
            }
        }
    })
}
