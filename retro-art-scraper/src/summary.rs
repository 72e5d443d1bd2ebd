use std::fmt::Write as _;
use std::path::Path;

use crate::batch::{BatchEvent, BatchState};
use crate::fetch::FetchOutcome;

/// One finished ROM as seen in the event stream.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub rom: String,
    pub system: String,
    pub outcome: FetchOutcome,
}

/// Collects the outcomes of a run and renders a report.
#[derive(Debug, Default)]
pub struct BatchSummary {
    entries: Vec<SummaryEntry>,
    fatal: Option<FetchOutcome>,
    state: Option<BatchState>,
}

/// Outcome tallies for a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummaryCounts {
    pub success: usize,
    pub partial: usize,
    pub not_found: usize,
    pub errors: usize,
    pub skipped: usize,
    pub artwork_downloaded: usize,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the summary.
    pub fn record(&mut self, event: &BatchEvent) {
        if event.outcome.is_fatal() {
            self.fatal = Some(event.outcome.clone());
        }
        if event.is_complete {
            return;
        }
        self.entries.push(SummaryEntry {
            rom: event.progress.current_rom.clone().unwrap_or_default(),
            system: event.progress.current_system.clone().unwrap_or_default(),
            outcome: event.outcome.clone(),
        });
    }

    pub fn set_state(&mut self, state: BatchState) {
        self.state = Some(state);
    }

    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    pub fn fatal(&self) -> Option<&FetchOutcome> {
        self.fatal.as_ref()
    }

    pub fn counts(&self) -> SummaryCounts {
        let mut counts = SummaryCounts::default();
        for entry in &self.entries {
            counts.artwork_downloaded += entry.outcome.downloaded_count();
            match entry.outcome {
                FetchOutcome::Success { .. } => counts.success += 1,
                FetchOutcome::PartialSuccess { .. } => counts.partial += 1,
                FetchOutcome::NotFound => counts.not_found += 1,
                FetchOutcome::Error { .. } => counts.errors += 1,
                FetchOutcome::Skipped => counts.skipped += 1,
                FetchOutcome::AuthError { .. } | FetchOutcome::QuotaExceeded { .. } => {}
            }
        }
        counts
    }

    /// Plain-text report: totals first, then every ROM that did not fully succeed.
    pub fn render(&self) -> String {
        let counts = self.counts();
        let mut out = String::new();

        let _ = writeln!(out, "=== Artwork Log ===");
        let _ = writeln!(
            out,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if let Some(state) = self.state {
            let _ = writeln!(out, "Result: {}", state_label(state));
        }
        if let Some(fatal) = &self.fatal {
            let _ = writeln!(out, "Stopped: {}", fatal_message(fatal));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Summary ---");
        let _ = writeln!(out, "Successful: {}", counts.success);
        let _ = writeln!(out, "Partial: {}", counts.partial);
        let _ = writeln!(out, "Not found: {}", counts.not_found);
        let _ = writeln!(out, "Errors: {}", counts.errors);
        let _ = writeln!(out, "Skipped: {}", counts.skipped);
        let _ = writeln!(out, "Artwork downloaded: {}", counts.artwork_downloaded);
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Details ---");

        for entry in &self.entries {
            let name = format!("{} ({})", entry.rom, entry.system);
            match &entry.outcome {
                FetchOutcome::PartialSuccess { downloaded, failed } => {
                    let _ = writeln!(out, "[PARTIAL] {}", name);
                    let _ = writeln!(out, "     Downloaded: {}", join(downloaded));
                    let _ = writeln!(out, "     Missing: {}", join(failed));
                }
                FetchOutcome::NotFound => {
                    let _ = writeln!(out, "[NOT FOUND] {}", name);
                }
                FetchOutcome::Error { message } => {
                    let _ = writeln!(out, "[ERROR] {}: {}", name, message);
                }
                FetchOutcome::AuthError { message } | FetchOutcome::QuotaExceeded { message } => {
                    let _ = writeln!(out, "[STOPPED] {}: {}", name, message);
                }
                _ => {}
            }
        }
        out
    }

    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn state_label(state: BatchState) -> &'static str {
    match state {
        BatchState::Idle => "not started",
        BatchState::Running => "running",
        BatchState::Completed => "completed",
        BatchState::Aborted => "aborted",
    }
}

fn fatal_message(outcome: &FetchOutcome) -> &str {
    match outcome {
        FetchOutcome::AuthError { message } | FetchOutcome::QuotaExceeded { message } => message,
        other => other.label(),
    }
}
