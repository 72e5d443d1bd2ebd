//! Terminal progress display for a scrape run.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_art_scraper::{BatchEvent, FetchOutcome};

/// A single-line spinner for short waits (connecting, scanning).
pub(crate) fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("/-\\|"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Overall bar for a batch, advanced once per finished ROM.
pub(crate) struct BatchBar {
    bar: ProgressBar,
}

impl BatchBar {
    pub(crate) fn new(total: usize, quiet: bool) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(total as u64),
            if quiet {
                ProgressDrawTarget::hidden()
            } else {
                ProgressDrawTarget::stderr()
            },
        );
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
        ) {
            bar.set_style(style.tick_chars("/-\\|").progress_chars("=> "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Reflect one event. Per-ROM failures are logged above the bar.
    pub(crate) fn update(&self, event: &BatchEvent) {
        let progress = &event.progress;
        self.bar.set_position(progress.completed_roms as u64);
        if event.is_complete {
            return;
        }

        let rom = progress.current_rom.as_deref().unwrap_or_default();
        let system = progress.current_system.as_deref().unwrap_or_default();
        self.bar.set_message(format!("{} ({})", rom, system));

        match &event.outcome {
            FetchOutcome::NotFound => self.bar.suspend(|| {
                log::debug!(
                    "  {} {}: not found",
                    "?".if_supports_color(Stdout, |t| t.yellow()),
                    rom,
                );
            }),
            FetchOutcome::Error { message } => self.bar.suspend(|| {
                log::warn!(
                    "  {} {}: {}",
                    "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                    rom,
                    message,
                );
            }),
            FetchOutcome::PartialSuccess { failed, .. } => self.bar.suspend(|| {
                log::debug!(
                    "  {} {}: missing {}",
                    "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                    rom,
                    failed
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                );
            }),
            _ => {}
        }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
