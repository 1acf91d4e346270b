//! Live log tailing for a single job
//!
//! A [`LogTailSession`] owns one `tail -f` child process. The session is
//! stopped when it is closed, shut down, or dropped; in every case the child
//! is killed and reaped by the reader task.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use futures::FutureExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::JobDetails;
use crate::tui::event::DataEvent;

/// Lines forwarded to the UI in one event at most
const MAX_BATCH: usize = 256;

/// Where a log path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPathSource {
    /// `StdOut` as reported by the scheduler
    Reported,
    /// Slurm's default `slurm-<id>.out` naming under the working directory
    Guessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPath {
    pub path: PathBuf,
    pub source: LogPathSource,
}

/// Pick the file to tail for a job.
///
/// Falls back to `<WorkDir>/slurm-<id>.out` (or `./slurm-<id>.out`) when the
/// scheduler reports no output path.
#[must_use]
pub fn resolve_log_path(job_id: &str, details: &JobDetails) -> LogPath {
    if let Some(std_out) = details.std_out() {
        return LogPath {
            path: PathBuf::from(std_out),
            source: LogPathSource::Reported,
        };
    }

    let work_dir = details.work_dir().unwrap_or(".");
    LogPath {
        path: Path::new(work_dir).join(format!("slurm-{}.out", job_id)),
        source: LogPathSource::Guessed,
    }
}

/// Progress reported by a tail session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// `tail` is running
    Started { pid: Option<u32> },
    Lines(Vec<String>),
    /// The file did not exist; no process was started
    NotFound,
    /// `tail` exited on its own
    Ended { code: Option<i32> },
    Failed(String),
}

/// Lifecycle of a session as seen by the log view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Spawning,
    Streaming,
    NotFound,
    Exited,
    Failed,
}

impl LogStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            LogStatus::Spawning => "starting",
            LogStatus::Streaming => "streaming",
            LogStatus::NotFound => "file not found",
            LogStatus::Exited => "tail exited",
            LogStatus::Failed => "failed",
        }
    }
}

/// A running (or finished) `tail -f` for one job
#[derive(Debug)]
pub struct LogTailSession {
    id: u64,
    job_id: String,
    log_path: LogPath,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LogTailSession {
    /// Start tailing `log_path`, delivering [`DataEvent::Log`] events tagged with `id`.
    pub fn start(
        id: u64,
        job_id: String,
        log_path: LogPath,
        initial_lines: usize,
        tx: mpsc::Sender<DataEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_tail(
            id,
            log_path.path.clone(),
            initial_lines,
            tx,
            cancel.clone(),
        ));

        tracing::debug!(session = id, job_id = %job_id, path = %log_path.path.display(), "log tail started");
        Self {
            id,
            job_id,
            log_path,
            cancel,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    #[must_use]
    pub fn log_path(&self) -> &LogPath {
        &self.log_path
    }

    /// Ask the reader task to kill `tail` and stop
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Close the session and wait for the process to be reaped
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .is_err()
        {
            tracing::warn!(session = self.id, "log tail did not stop in time");
        }
    }
}

impl Drop for LogTailSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Send unless the session is being cancelled. Returns false when the
/// reader should stop.
async fn deliver(
    tx: &mpsc::Sender<DataEvent>,
    cancel: &CancellationToken,
    session: u64,
    event: LogEvent,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(DataEvent::Log { session, event }) => sent.is_ok(),
    }
}

async fn terminate(child: &mut Child, session: u64) {
    if let Err(e) = child.kill().await {
        tracing::warn!(session, error = %e, "failed to kill tail");
    }
}

async fn run_tail(
    session: u64,
    path: PathBuf,
    initial_lines: usize,
    tx: mpsc::Sender<DataEvent>,
    cancel: CancellationToken,
) {
    if !matches!(tokio::fs::try_exists(&path).await, Ok(true)) {
        deliver(&tx, &cancel, session, LogEvent::NotFound).await;
        return;
    }

    let spawned = Command::new("tail")
        .arg("-f")
        .arg("-n")
        .arg(initial_lines.to_string())
        .arg(&path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(session, error = %e, "failed to start tail");
            deliver(&tx, &cancel, session, LogEvent::Failed(format!("Failed to start tail: {e}"))).await;
            return;
        }
    };

    let Some(stdout) = child.stdout.take() else {
        terminate(&mut child, session).await;
        return;
    };

    if !deliver(&tx, &cancel, session, LogEvent::Started { pid: child.id() }).await {
        terminate(&mut child, session).await;
        return;
    }

    let mut lines = BufReader::new(stdout).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                terminate(&mut child, session).await;
                tracing::debug!(session, "log tail stopped");
                return;
            }
            line = lines.next_line() => match line {
                Ok(Some(first)) => {
                    let mut batch = vec![first];
                    // Drain whatever is already buffered without waiting
                    while batch.len() < MAX_BATCH {
                        match lines.next_line().now_or_never() {
                            Some(Ok(Some(line))) => batch.push(line),
                            _ => break,
                        }
                    }
                    if !deliver(&tx, &cancel, session, LogEvent::Lines(batch)).await {
                        terminate(&mut child, session).await;
                        return;
                    }
                }
                Ok(None) => {
                    let code = child.wait().await.ok().and_then(|status| status.code());
                    deliver(&tx, &cancel, session, LogEvent::Ended { code }).await;
                    return;
                }
                Err(e) => {
                    terminate(&mut child, session).await;
                    deliver(&tx, &cancel, session, LogEvent::Failed(format!("Read error: {e}"))).await;
                    return;
                }
            }
        }
    }
}

/// Scrollback and state of the log view for one session
#[derive(Debug)]
pub struct LogView {
    pub session: LogTailSession,
    pub lines: VecDeque<String>,
    pub status: LogStatus,
    /// Lines between the bottom of the viewport and the newest line
    pub offset: usize,
    /// Keep the newest line in view
    pub follow: bool,
    max_lines: usize,
}

impl LogView {
    pub fn new(session: LogTailSession, max_lines: usize) -> Self {
        let mut lines = VecDeque::new();
        lines.push_back(format!("Tailing {}...", session.log_path().path.display()));
        Self {
            session,
            lines,
            status: LogStatus::Spawning,
            offset: 0,
            follow: true,
            max_lines: max_lines.max(1),
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "Logs for Job {}: {}",
            self.session.job_id(),
            self.session.log_path().path.display()
        )
    }

    /// Apply an event from this view's session
    pub fn apply(&mut self, event: LogEvent) {
        match event {
            LogEvent::Started { .. } => self.status = LogStatus::Streaming,
            LogEvent::Lines(lines) => self.push_lines(lines),
            LogEvent::NotFound => {
                self.status = LogStatus::NotFound;
                self.push_lines(vec!["Log file not found yet.".to_string()]);
            }
            LogEvent::Ended { code } => {
                self.status = LogStatus::Exited;
                tracing::debug!(session = self.session.id(), ?code, "tail exited");
            }
            LogEvent::Failed(message) => {
                self.status = LogStatus::Failed;
                self.push_lines(vec![message]);
            }
        }
    }

    fn push_lines(&mut self, lines: Vec<String>) {
        let added = lines.len();
        for line in lines {
            if self.lines.len() == self.max_lines {
                self.lines.pop_front();
            }
            self.lines.push_back(line);
        }
        if !self.follow {
            // Keep the same lines on screen while new output arrives
            self.offset = (self.offset + added).min(self.lines.len().saturating_sub(1));
        }
    }

    /// Index of the first line shown in a viewport of `height` lines
    #[must_use]
    pub fn first_visible(&self, height: usize) -> usize {
        self.lines
            .len()
            .saturating_sub(height)
            .saturating_sub(self.offset)
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.follow = false;
        self.offset = (self.offset + amount).min(self.lines.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.offset = self.offset.saturating_sub(amount);
    }

    pub fn scroll_to_top(&mut self) {
        self.follow = false;
        self.offset = self.lines.len().saturating_sub(1);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = 0;
        self.follow = true;
    }

    pub fn toggle_follow(&mut self) {
        if self.follow {
            self.follow = false;
        } else {
            self.scroll_to_bottom();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(text: &str) -> JobDetails {
        JobDetails::parse(text).unwrap()
    }

    #[test]
    fn test_resolve_reported_path() {
        let path = resolve_log_path("42", &details("JobId=42 StdOut=/scratch/out.log WorkDir=/home/a"));
        assert_eq!(path.path, PathBuf::from("/scratch/out.log"));
        assert_eq!(path.source, LogPathSource::Reported);
    }

    #[test]
    fn test_resolve_guessed_from_work_dir() {
        let path = resolve_log_path("42", &details("JobId=42 WorkDir=/home/a"));
        assert_eq!(path.path, PathBuf::from("/home/a/slurm-42.out"));
        assert_eq!(path.source, LogPathSource::Guessed);
    }

    #[test]
    fn test_resolve_guessed_without_details() {
        let path = resolve_log_path("42", &JobDetails::default());
        assert_eq!(path.path, PathBuf::from("./slurm-42.out"));
        assert_eq!(path.source, LogPathSource::Guessed);
    }

    async fn next_log(rx: &mut mpsc::Receiver<DataEvent>) -> (u64, LogEvent) {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for log event")
            .expect("channel closed");
        match event {
            DataEvent::Log { session, event } => (session, event),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_starts_no_process() {
        let (tx, mut rx) = mpsc::channel(8);
        let path = LogPath {
            path: std::env::temp_dir().join("sktop-no-such-dir/slurm-1.out"),
            source: LogPathSource::Guessed,
        };
        let session = LogTailSession::start(3, "1".into(), path, 100, tx);

        assert_eq!(next_log(&mut rx).await, (3, LogEvent::NotFound));
        session.shutdown().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_lines_and_kills_on_shutdown() {
        let dir = crate::slurm::test_support::scratch_dir("log-tail");
        let file = dir.join("job.out");
        std::fs::write(&file, "one\ntwo\nthree\n").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let path = LogPath {
            path: file.clone(),
            source: LogPathSource::Reported,
        };
        let session = LogTailSession::start(1, "9".into(), path, 2, tx);

        let pid = match next_log(&mut rx).await {
            (1, LogEvent::Started { pid }) => pid,
            other => panic!("unexpected event: {other:?}"),
        };

        let mut received = Vec::new();
        while received.len() < 2 {
            match next_log(&mut rx).await {
                (1, LogEvent::Lines(lines)) => received.extend(lines),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(received, vec!["two", "three"]);

        session.shutdown().await;

        #[cfg(target_os = "linux")]
        if let Some(pid) = pid {
            assert!(!Path::new(&format!("/proc/{pid}")).exists(), "tail still running");
        }
        #[cfg(not(target_os = "linux"))]
        let _ = pid;
    }

    #[tokio::test]
    async fn test_drop_cancels_session() {
        let (tx, _rx) = mpsc::channel(8);
        let path = LogPath {
            path: PathBuf::from("/nonexistent/slurm-5.out"),
            source: LogPathSource::Guessed,
        };
        let session = LogTailSession::start(2, "5".into(), path, 10, tx);
        let cancel = session.cancel.clone();
        drop(session);
        assert!(cancel.is_cancelled());
    }

    fn view_with_lines(max_lines: usize) -> LogView {
        let path = LogPath {
            path: PathBuf::from("/tmp/x.out"),
            source: LogPathSource::Reported,
        };
        let session = LogTailSession {
            id: 1,
            job_id: "1".into(),
            log_path: path,
            cancel: CancellationToken::new(),
            handle: None,
        };
        LogView::new(session, max_lines)
    }

    #[test]
    fn test_view_starts_with_tailing_notice() {
        let view = view_with_lines(10);
        assert_eq!(view.lines.front().map(String::as_str), Some("Tailing /tmp/x.out..."));
        assert_eq!(view.title(), "Logs for Job 1: /tmp/x.out");
    }

    #[test]
    fn test_view_buffer_is_bounded() {
        let mut view = view_with_lines(3);
        view.apply(LogEvent::Lines(vec!["a".into(), "b".into(), "c".into(), "d".into()]));
        assert_eq!(view.lines, VecDeque::from(vec!["b".to_string(), "c".into(), "d".into()]));
    }

    #[test]
    fn test_view_follow_tracks_bottom() {
        let mut view = view_with_lines(100);
        view.apply(LogEvent::Lines((0..20).map(|i| i.to_string()).collect()));
        assert_eq!(view.first_visible(5), 16);

        view.scroll_up(3);
        assert!(!view.follow);
        assert_eq!(view.first_visible(5), 13);

        // New output does not move a paused view
        view.apply(LogEvent::Lines(vec!["new".into()]));
        assert_eq!(view.first_visible(5), 13);

        view.scroll_to_bottom();
        assert_eq!(view.first_visible(5), 17);
    }

    #[test]
    fn test_view_scroll_to_top() {
        let mut view = view_with_lines(100);
        view.apply(LogEvent::Lines((0..20).map(|i| i.to_string()).collect()));
        view.scroll_to_top();
        assert_eq!(view.first_visible(5), 0);

        view.toggle_follow();
        assert!(view.follow);
        assert_eq!(view.first_visible(5), 16);
    }

    #[test]
    fn test_view_not_found_message() {
        let mut view = view_with_lines(10);
        view.apply(LogEvent::NotFound);
        assert_eq!(view.status, LogStatus::NotFound);
        assert_eq!(view.lines.back().map(String::as_str), Some("Log file not found yet."));
    }
}
