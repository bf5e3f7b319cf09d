//! Progress bar for the removal and upload phases

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reconcile::{Action, ProgressCallback, TaskOutcome, TaskResult};

use crate::ui;

/// One bar per phase; failures are printed above the bar as they land
pub struct PhaseBar {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl PhaseBar {
    pub fn new(hidden: bool) -> Self {
        Self { bar: None, hidden }
    }
}

impl ProgressCallback for PhaseBar {
    fn on_phase_start(&mut self, action: Action, total: usize) {
        let bar = if self.hidden || total == 0 {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new(total as u64)
        };
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_message(match action {
            Action::Add => "Uploading",
            Action::Remove => "Removing",
        });
        self.bar = Some(bar);
    }

    fn on_task_complete(&mut self, outcome: &TaskOutcome) {
        let Some(bar) = &self.bar else {
            return;
        };
        if let TaskResult::Failed(e) = &outcome.result {
            bar.suspend(|| ui::failure(&outcome.id, outcome.action, e));
        }
        bar.inc(1);
    }

    fn on_phase_complete(&mut self, _action: Action) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
