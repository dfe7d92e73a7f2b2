use champs::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
/// Bond inference reports per-offset steps without opening a phase of its own.
const UNNAMED_PHASE: &str = "Bond inference";

/// What one step of a counted task is, given the phase that runs it.
fn step_unit(phase: &str) -> &'static str {
    match phase {
        "Cross-validation" => "folds",
        "Tuning" => "trials",
        UNNAMED_PHASE => "offsets",
        _ => "steps",
    }
}

struct PipelineBar {
    pb: ProgressBar,
    phase: Option<&'static str>,
    /// The latest status line of the running phase (a fold or trial score).
    status: Option<String>,
}

impl PipelineBar {
    fn phase_name(&self) -> &'static str {
        self.phase.unwrap_or(UNNAMED_PHASE)
    }

    fn handle(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = Some(name);
                self.status = None;
                self.pb.reset();
                self.pb.set_length(0);
                self.pb.set_style(spinner_style());
                self.pb.set_prefix(name);
                self.pb.set_message(name);
                self.pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                self.pb.disable_steady_tick();
                let summary = match self.status.take() {
                    Some(status) => format!("✓ {}: {}", self.phase_name(), status),
                    None => format!("✓ {}", self.phase_name()),
                };
                self.pb.finish_with_message(summary);
                self.phase = None;
            }
            Progress::TaskStart { total_steps } => {
                let phase = self.phase_name();
                self.pb.disable_steady_tick();
                self.pb.reset();
                self.pb.set_length(total_steps);
                self.pb.set_position(0);
                self.pb.set_style(bar_style(step_unit(phase)));
                self.pb.set_prefix(phase);
                self.pb.set_message(String::new());
            }
            Progress::TaskIncrement => self.pb.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = self.pb.length() {
                    self.pb.set_position(length);
                }
                self.pb.finish();
            }
            Progress::Message(msg) => {
                if self.pb.is_finished() {
                    self.pb.println(format!("  {}", msg));
                } else {
                    self.pb.set_message(msg.clone());
                }
                self.status = Some(msg);
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style(unit: &str) -> ProgressStyle {
    let template = format!(
        "{{prefix:<18}} [{{bar:32.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}}) {{msg}}",
        unit
    );
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("##-")
}

/// Renders pipeline progress on stderr.
///
/// Bond inference shows one step per window offset, cross-validation one per fold and
/// tuning one per trial. Score messages reported while a bar runs replace its trailing
/// status, so the bar always shows the latest fold or trial score; the last one is kept
/// in the phase's completion line.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: Arc<Mutex<PipelineBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0).with_style(spinner_style());
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            bar: Arc::new(Mutex::new(PipelineBar {
                pb,
                phase: None,
                status: None,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let bar = self.bar.clone();
        Box::new(move |progress: Progress| match bar.lock() {
            Ok(mut bar) => bar.handle(progress),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use champs::engine::progress::ProgressReporter;
    use std::thread;

    fn hidden_handler() -> CliProgressHandler {
        let handler = CliProgressHandler::new();
        handler
            .bar
            .lock()
            .unwrap()
            .pb
            .set_draw_target(ProgressDrawTarget::hidden());
        handler
    }

    #[test]
    fn handler_starts_finished_and_empty() {
        let handler = CliProgressHandler::new();
        let bar = handler.bar.lock().unwrap();
        assert_eq!(bar.pb.length(), Some(0));
        assert!(bar.pb.is_finished());
        assert!(bar.phase.is_none());
    }

    #[test]
    fn fold_scores_follow_the_cross_validation_bar() {
        let handler = hidden_handler();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Cross-validation",
        });
        callback(Progress::TaskStart { total_steps: 3 });
        {
            let bar = handler.bar.lock().unwrap();
            assert_eq!(bar.pb.prefix(), "Cross-validation");
            assert_eq!(bar.pb.length(), Some(3));
        }

        callback(Progress::Message("fold 1/3: -1.2000 (mean -1.2000)".to_string()));
        callback(Progress::TaskIncrement);
        callback(Progress::Message("fold 2/3: -0.8000 (mean -1.0000)".to_string()));
        callback(Progress::TaskIncrement);
        {
            let bar = handler.bar.lock().unwrap();
            assert_eq!(bar.pb.position(), 2);
            assert_eq!(bar.pb.message(), "fold 2/3: -0.8000 (mean -1.0000)");
        }

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        let bar = handler.bar.lock().unwrap();
        assert_eq!(bar.pb.position(), 3);
        assert_eq!(
            bar.pb.message(),
            "✓ Cross-validation: fold 2/3: -0.8000 (mean -1.0000)"
        );
        assert!(bar.phase.is_none());
    }

    #[test]
    fn bond_offsets_run_without_a_named_phase() {
        let handler = hidden_handler();
        let callback = handler.get_callback();

        callback(Progress::TaskStart { total_steps: 27 });
        for _ in 0..27 {
            callback(Progress::TaskIncrement);
        }
        callback(Progress::TaskFinish);

        let bar = handler.bar.lock().unwrap();
        assert_eq!(bar.pb.prefix(), "Bond inference");
        assert_eq!(bar.pb.position(), 27);
        assert!(bar.pb.is_finished());
    }

    #[test]
    fn phases_without_scores_finish_with_their_name() {
        let handler = hidden_handler();
        let callback = handler.get_callback();
        callback(Progress::PhaseStart {
            name: "Feature extraction",
        });
        callback(Progress::PhaseFinish);
        assert_eq!(
            handler.bar.lock().unwrap().pb.message(),
            "✓ Feature extraction"
        );
    }

    #[test]
    fn step_units_name_what_each_phase_counts() {
        assert_eq!(step_unit("Cross-validation"), "folds");
        assert_eq!(step_unit("Tuning"), "trials");
        assert_eq!(step_unit(UNNAMED_PHASE), "offsets");
        assert_eq!(step_unit("Feature extraction"), "steps");
    }

    #[test]
    fn tuning_trials_can_be_reported_from_another_thread() {
        let handler = hidden_handler();
        let callback = handler.get_callback();

        thread::spawn(move || {
            let reporter = ProgressReporter::with_callback(callback);
            reporter.phase("Tuning", || {
                reporter.report(Progress::TaskStart { total_steps: 1 });
                reporter.report(Progress::Message("trial 1/1: -2.0000 (best -2.0000)".into()));
                reporter.report(Progress::TaskIncrement);
                reporter.report(Progress::TaskFinish);
            });
        })
        .join()
        .unwrap();

        let bar = handler.bar.lock().unwrap();
        assert!(bar.pb.is_finished());
        assert_eq!(bar.pb.message(), "✓ Tuning: trial 1/1: -2.0000 (best -2.0000)");
    }
}
