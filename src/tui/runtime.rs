//! Async runtime and task management for the TUI
//!
//! This module implements the dual-channel event-driven architecture:
//! - Input channel (priority): User input events that are never dropped
//! - Data channel: Results of scheduler calls, log output and clock ticks
//!
//! The main loop uses `tokio::select!` with bias toward the input channel
//! to prevent input starvation under heavy log output.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::tui::app::App;
use crate::tui::event::{DataEvent, EventResult, InputEvent};

/// Channel capacities
const INPUT_CHANNEL_CAPACITY: usize = 16;
const DATA_CHANNEL_CAPACITY: usize = 32;

const CLOCK_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// TUI runtime managing all background tasks
pub struct TuiRuntime {
    cancel_token: CancellationToken,
    task_handles: Vec<JoinHandle<()>>,
}

impl TuiRuntime {
    /// Create a new TUI runtime
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            task_handles: Vec::new(),
        }
    }

    /// Get a clone of the cancellation token for spawning tasks
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Add a task handle to track
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.task_handles.push(handle);
    }

    /// Signal shutdown and wait for tasks to complete
    pub async fn shutdown(self) {
        self.cancel_token.cancel();

        let shutdown = async {
            for handle in self.task_handles {
                let _ = handle.await;
            }
        };

        tokio::select! {
            _ = shutdown => {}
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                tracing::warn!("background tasks did not stop in time");
            }
        }
    }
}

/// Spawn the input event reader task
pub fn spawn_input_task(tx: mpsc::Sender<InputEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = EventStream::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_event = reader.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            let input_event = match event {
                                Event::Key(key) => Some(InputEvent::Key(key)),
                                Event::Mouse(mouse) => Some(InputEvent::Mouse(mouse)),
                                Event::Resize(_, _) => Some(InputEvent::Resize),
                                _ => None,
                            };

                            if let Some(evt) = input_event
                                && tx.send(evt).await.is_err()
                            {
                                break; // Receiver dropped
                            }
                        }
                        Some(Err(e)) => {
                            let is_fatal = matches!(
                                e.kind(),
                                std::io::ErrorKind::BrokenPipe
                                    | std::io::ErrorKind::ConnectionReset
                                    | std::io::ErrorKind::UnexpectedEof
                            );

                            if is_fatal {
                                tracing::info!("Terminal disconnected: {:?}", e);
                                break;
                            } else {
                                tracing::warn!("Terminal event read error: {:?}", e);
                            }
                        }
                        None => break, // Stream ended
                    }
                }
            }
        }
    })
}

/// Spawn the once-per-second clock tick
pub fn spawn_clock_tick(tx: mpsc::Sender<DataEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLOCK_TICK_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    // A missed tick is harmless; the next one redraws the clock
                    let _ = tx.try_send(DataEvent::ClockTick);
                }
            }
        }
    })
}

/// Run the main TUI event loop.
///
/// On exit any open log view is shut down so its `tail` process is reaped
/// before the terminal is restored.
pub async fn run_event_loop(
    mut app: App,
    mut input_rx: mpsc::Receiver<InputEvent>,
    mut data_rx: mpsc::Receiver<DataEvent>,
    mut render_fn: impl FnMut(&App) -> Result<()>,
) -> Result<()> {
    let mut needs_render = true;

    let result = loop {
        if needs_render {
            if let Err(e) = render_fn(&app) {
                break Err(e);
            }
            needs_render = false;
        }

        if !app.running {
            break Ok(());
        }

        tokio::select! {
            // Bias toward input channel to prevent input starvation
            biased;

            Some(input) = input_rx.recv() => {
                match app.handle_input(input) {
                    EventResult::Continue => needs_render = true,
                    EventResult::Unchanged => {}
                    EventResult::Quit => break Ok(()),
                }
            }

            Some(data) = data_rx.recv() => {
                match app.handle_data(data) {
                    EventResult::Continue => needs_render = true,
                    EventResult::Unchanged => {}
                    EventResult::Quit => break Ok(()),
                }
            }

            else => break Ok(()),
        }
    };

    if let Some(view) = app.take_log_view() {
        view.session.shutdown().await;
    }

    result
}

/// Create the dual channels for the TUI
pub fn create_channels() -> (
    mpsc::Sender<InputEvent>,
    mpsc::Receiver<InputEvent>,
    mpsc::Sender<DataEvent>,
    mpsc::Receiver<DataEvent>,
) {
    let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    let (data_tx, data_rx) = mpsc::channel(DATA_CHANNEL_CAPACITY);
    (input_tx, input_rx, data_tx, data_rx)
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::models::TuiConfig;
    use crate::slurm::SlurmInterface;

    fn app(data_tx: mpsc::Sender<DataEvent>) -> App {
        App::new(
            TuiConfig::default(),
            Vec::new(),
            "alice".into(),
            SlurmInterface::with_config(Some(&std::env::temp_dir())),
            data_tx,
        )
    }

    #[tokio::test]
    async fn test_event_loop_quits_on_q() {
        let (input_tx, input_rx, data_tx, data_rx) = create_channels();
        let app = app(data_tx);

        input_tx
            .send(InputEvent::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)))
            .await
            .unwrap();

        let mut renders = 0;
        run_event_loop(app, input_rx, data_rx, |_| {
            renders += 1;
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(renders, 1);
    }

    #[tokio::test]
    async fn test_event_loop_renders_on_clock_tick() {
        let (input_tx, input_rx, data_tx, data_rx) = create_channels();
        let app = app(data_tx.clone());

        data_tx.send(DataEvent::ClockTick).await.unwrap();
        let mut renders = 0;
        let loop_task = run_event_loop(app, input_rx, data_rx, move |_| {
            renders += 1;
            if renders == 2 {
                anyhow::bail!("stop after tick render");
            }
            Ok(())
        });

        let err = loop_task.await.unwrap_err();
        assert!(err.to_string().contains("stop after tick render"));
        drop(input_tx);
    }

    #[tokio::test]
    async fn test_clock_tick_stops_on_cancel() {
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let handle = spawn_clock_tick(tx, cancel.clone());

        assert!(matches!(rx.recv().await, Some(DataEvent::ClockTick)));
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_runtime_shutdown_cancels_tracked_tasks() {
        let mut runtime = TuiRuntime::new();
        let cancel = runtime.cancel_token();
        runtime.track(tokio::spawn(async move { cancel.cancelled().await }));
        runtime.shutdown().await;
    }
}
