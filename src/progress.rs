//! Progress reporting for batch uninstalls
//!
//! Drives an indicatif bar on stdout and, on terminals that understand it, the
//! native OSC 9;4 progress indicator (Ghostty, WezTerm, Windows Terminal, ConEmu;
//! ignored elsewhere).

use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress state for terminal indicators
#[derive(Debug, Clone, Copy)]
enum ProgressState {
    Off = 0,
    Normal = 1,
    Error = 2,
}

fn set_terminal_progress(progress: u8, state: ProgressState) {
    let progress = progress.min(100);
    print!("\x1b]9;4;{};{}\x1b\\", state as u8, progress);
    let _ = io::stdout().flush();
}

fn clear_terminal_progress() {
    set_terminal_progress(0, ProgressState::Off);
}

/// Don't draw progress when piped or when NO_COLOR is set
pub fn should_show_progress() -> bool {
    io::stdout().is_terminal() && env::var("NO_COLOR").is_err()
}

/// Whole-number percentage, capped at 100
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).min(100.0) as u8
}

/// Shared progress for a batch; safe to update from several workers
pub struct BatchProgress {
    bar: ProgressBar,
    native: bool,
    total: usize,
    finished: AtomicUsize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        let native = should_show_progress();
        let bar = if native {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            set_terminal_progress(0, ProgressState::Normal);
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            native,
            total,
            finished: AtomicUsize::new(0),
        }
    }

    /// Print a line above the bar (or plainly when the bar is hidden)
    pub fn println(&self, line: impl AsRef<str>) {
        if self.bar.is_hidden() {
            println!("{}", line.as_ref());
        } else {
            self.bar.println(line.as_ref());
        }
    }

    pub fn item_started(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    pub fn item_finished(&self) {
        let done = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.inc(1);
        if self.native {
            set_terminal_progress(percent(done, self.total), ProgressState::Normal);
        }
    }

    /// Finish the bar, flashing the error state if anything failed
    pub fn finish(&self, success: bool) {
        self.bar.finish_and_clear();
        if self.native {
            if success {
                set_terminal_progress(100, ProgressState::Normal);
                std::thread::sleep(std::time::Duration::from_millis(100));
            } else {
                set_terminal_progress(100, ProgressState::Error);
                std::thread::sleep(std::time::Duration::from_millis(200));
            }
            clear_terminal_progress();
        }
    }
}

impl Drop for BatchProgress {
    fn drop(&mut self) {
        if self.native {
            clear_terminal_progress();
        }
    }
}
