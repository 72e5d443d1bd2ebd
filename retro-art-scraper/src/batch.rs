//! Batch scheduling of artwork fetches.
//!
//! A [`BatchScheduler`] runs one [`ArtworkFetcher::fetch`] per job, either
//! strictly in order (one worker) or through a bounded [`WorkerPool`]. Results
//! are folded into a [`BatchProgress`] on a single coordinating path, which
//! also records not-found ROMs and emits one [`BatchEvent`] per finished job.
//!
//! An auth or quota failure cancels the run: no further jobs are admitted,
//! in-flight jobs are abandoned, and a terminal event carrying the fatal
//! outcome is emitted. External cancellation uses the same token.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;
use retro_art_lib::{RomEntry, RomSystem, WorkerPool};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::fetch::{ArtworkFetcher, FetchOutcome};
use crate::memo::NotFoundMemo;

/// Upper bound on one job, backoff included. Below the worker pool's own
/// safety net so a hung job still yields an outcome.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(540);

/// One ROM to process, with the system it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomJob {
    pub rom: RomEntry,
    /// Remote catalog system ID
    pub system_id: u32,
    /// Human-readable system name
    pub system_name: String,
}

/// Flatten scanned systems into jobs, in scan order.
pub fn jobs_from_systems(systems: &[RomSystem]) -> Vec<RomJob> {
    systems
        .iter()
        .flat_map(|system| {
            system.roms.iter().map(|rom| RomJob {
                rom: rom.clone(),
                system_id: system.system_id,
                system_name: system.display_name.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemProgress {
    pub total: usize,
    pub completed: usize,
}

/// Aggregate progress of a batch. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub total_roms: usize,
    pub completed_roms: usize,
    /// File name of the most recently finished ROM
    pub current_rom: Option<String>,
    /// Display name of that ROM's system
    pub current_system: Option<String>,
    /// Per-system breakdown keyed by system folder name
    pub systems: BTreeMap<String, SystemProgress>,
}

impl BatchProgress {
    pub fn new(jobs: &[RomJob]) -> Self {
        let mut systems: BTreeMap<String, SystemProgress> = BTreeMap::new();
        for job in jobs {
            systems
                .entry(job.rom.system_folder.clone())
                .or_default()
                .total += 1;
        }
        Self {
            total_roms: jobs.len(),
            systems,
            ..Default::default()
        }
    }

    /// Completed fraction in `0.0..=1.0`; zero for an empty batch.
    pub fn fraction(&self) -> f64 {
        if self.total_roms == 0 {
            0.0
        } else {
            self.completed_roms as f64 / self.total_roms as f64
        }
    }

    fn complete(&mut self, job: &RomJob) {
        self.completed_roms += 1;
        self.current_rom = Some(job.rom.name.clone());
        self.current_system = Some(job.system_name.clone());
        if let Some(system) = self.systems.get_mut(&job.rom.system_folder) {
            system.completed += 1;
        }
    }
}

/// Progress update sent after each finished job, and once at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEvent {
    pub progress: BatchProgress,
    /// Outcome of the job that just finished. On the terminal event, the
    /// fatal outcome that stopped the run, or `Skipped`.
    pub outcome: FetchOutcome,
    /// Set on the terminal event only
    pub is_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    /// Every job finished
    Completed,
    /// Stopped early by a fatal outcome or cancellation
    Aborted,
}

/// Drives a batch of jobs through an [`ArtworkFetcher`].
#[derive(Clone)]
pub struct BatchScheduler {
    fetcher: Arc<ArtworkFetcher>,
    memo: Arc<dyn NotFoundMemo>,
    workers: usize,
    job_timeout: Duration,
    state: Arc<Mutex<BatchState>>,
}

impl BatchScheduler {
    /// `workers` of one (or zero) runs jobs strictly in order.
    pub fn new(fetcher: Arc<ArtworkFetcher>, memo: Arc<dyn NotFoundMemo>, workers: usize) -> Self {
        Self {
            fetcher,
            memo,
            workers: workers.max(1),
            job_timeout: JOB_TIMEOUT,
            state: Arc::new(Mutex::new(BatchState::Idle)),
        }
    }

    /// Override [`JOB_TIMEOUT`]. Values above it are clamped.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout.min(JOB_TIMEOUT);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: BatchState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Run `jobs` to completion or abort, sending events to `events`.
    ///
    /// The terminal event (`is_complete = true`) is always the last one sent,
    /// exactly once. Returns the final state.
    pub async fn run(
        &self,
        jobs: Vec<RomJob>,
        events: mpsc::UnboundedSender<BatchEvent>,
        cancel: CancellationToken,
    ) -> BatchState {
        self.set_state(BatchState::Running);
        let run_token = cancel.child_token();
        let mut progress = BatchProgress::new(&jobs);
        log::info!(
            "Fetching artwork for {} ROMs with {} worker(s)",
            jobs.len(),
            self.workers
        );

        let fatal = if self.workers <= 1 {
            self.run_sequential(jobs, &mut progress, &events, &run_token)
                .await
        } else {
            self.run_concurrent(jobs, &mut progress, &events, &run_token)
                .await
        };

        let (state, outcome) = match fatal {
            Some(outcome) => {
                log::warn!("Stopping batch: {}", outcome_message(&outcome));
                (BatchState::Aborted, outcome)
            }
            None if run_token.is_cancelled() && progress.completed_roms < progress.total_roms => {
                log::info!(
                    "Batch cancelled after {}/{} ROMs",
                    progress.completed_roms,
                    progress.total_roms
                );
                (BatchState::Aborted, FetchOutcome::Skipped)
            }
            None => {
                if progress.completed_roms < progress.total_roms {
                    log::warn!(
                        "{} ROM(s) finished without an outcome",
                        progress.total_roms - progress.completed_roms
                    );
                }
                (BatchState::Completed, FetchOutcome::Skipped)
            }
        };

        self.set_state(state);
        progress.current_rom = None;
        progress.current_system = None;
        let _ = events.send(BatchEvent {
            progress,
            outcome,
            is_complete: true,
        });
        state
    }

    /// Lazily start a run and stream its events.
    ///
    /// Nothing happens until the stream is first polled. Dropping the stream
    /// cancels the run; cancelling `cancel` does too.
    pub fn events(&self, jobs: Vec<RomJob>, cancel: CancellationToken) -> BatchEvents {
        let token = cancel.child_token();
        BatchEvents {
            pending: Some(PendingRun {
                scheduler: self.clone(),
                jobs,
                cancel: token.clone(),
            }),
            rx: None,
            _guard: token.drop_guard(),
        }
    }

    async fn run_sequential(
        &self,
        jobs: Vec<RomJob>,
        progress: &mut BatchProgress,
        events: &mpsc::UnboundedSender<BatchEvent>,
        run_token: &CancellationToken,
    ) -> Option<FetchOutcome> {
        for job in jobs {
            let outcome = tokio::select! {
                biased;
                _ = run_token.cancelled() => return None,
                outcome = fetch_bounded(&self.fetcher, &job, self.job_timeout) => outcome,
            };
            if let Some(fatal) = self.handle_result(&job, outcome, progress, events, run_token).await {
                return Some(fatal);
            }
        }
        None
    }

    async fn run_concurrent(
        &self,
        jobs: Vec<RomJob>,
        progress: &mut BatchProgress,
        events: &mpsc::UnboundedSender<BatchEvent>,
        run_token: &CancellationToken,
    ) -> Option<FetchOutcome> {
        let fetcher = self.fetcher.clone();
        let limit = self.job_timeout;
        let mut pool = WorkerPool::start(self.workers, jobs, run_token.clone(), move |job: RomJob| {
            let fetcher = fetcher.clone();
            async move {
                let outcome = fetch_bounded(&fetcher, &job, limit).await;
                (job, outcome)
            }
        });

        while let Some((job, outcome)) = pool.recv().await {
            if let Some(fatal) = self.handle_result(&job, outcome, progress, events, run_token).await {
                return Some(fatal);
            }
        }
        None
    }

    /// Fold one result into the run and emit its progress event. A fatal
    /// outcome then cancels the run and is returned.
    async fn handle_result(
        &self,
        job: &RomJob,
        outcome: FetchOutcome,
        progress: &mut BatchProgress,
        events: &mpsc::UnboundedSender<BatchEvent>,
        run_token: &CancellationToken,
    ) -> Option<FetchOutcome> {
        progress.complete(job);

        if outcome == FetchOutcome::NotFound {
            let key = job.rom.not_found_key();
            if let Err(e) = self.memo.insert(&key).await {
                log::warn!("Failed to record {} as not found: {}", key, e);
            }
        }

        log::debug!("{}: {}", job.rom.name, outcome.label());
        let fatal = outcome.is_fatal().then(|| outcome.clone());
        let _ = events.send(BatchEvent {
            progress: progress.clone(),
            outcome,
            is_complete: false,
        });

        if fatal.is_some() {
            run_token.cancel();
        }
        fatal
    }
}

/// Fetch one job, turning a hang past `limit` into an `Error` outcome.
async fn fetch_bounded(fetcher: &ArtworkFetcher, job: &RomJob, limit: Duration) -> FetchOutcome {
    match tokio::time::timeout(limit, fetcher.fetch(&job.rom, job.system_id)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            log::warn!("{} timed out after {}s", job.rom.name, limit.as_secs());
            FetchOutcome::Error {
                message: format!("timed out after {}s", limit.as_secs()),
            }
        }
    }
}

fn outcome_message(outcome: &FetchOutcome) -> &str {
    match outcome {
        FetchOutcome::AuthError { message }
        | FetchOutcome::QuotaExceeded { message }
        | FetchOutcome::Error { message } => message,
        other => other.label(),
    }
}

struct PendingRun {
    scheduler: BatchScheduler,
    jobs: Vec<RomJob>,
    cancel: CancellationToken,
}

/// Lazy, cancellable stream of [`BatchEvent`]s from [`BatchScheduler::events`].
///
/// The stream ends after the terminal event.
pub struct BatchEvents {
    pending: Option<PendingRun>,
    rx: Option<mpsc::UnboundedReceiver<BatchEvent>>,
    _guard: DropGuard,
}

impl Stream for BatchEvents {
    type Item = BatchEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<BatchEvent>> {
        let this = self.get_mut();
        if let Some(run) = this.pending.take() {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(async move {
                run.scheduler.run(run.jobs, tx, run.cancel).await;
            });
            this.rx = Some(rx);
        }
        match this.rx.as_mut() {
            Some(rx) => rx.poll_recv(cx),
            None => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
