//! Runs one extraction on a background thread. Progress and conflict
//! prompts arrive as [`RunEvent`]s; conflict answers go back through
//! [`RunHandle::decide`].

use crossbeam_channel::{unbounded, Receiver, Sender};
use rimsync_core::ConflictChoice;
use rimsync_domain::{FileReport, RunReport};

use crate::conflict::{ConflictContext, ConflictPrompt, Decision};
use crate::run::{ExtractionRun, RunControl};

#[derive(Debug)]
pub enum RunEvent {
    /// The run is blocked until a decision is sent.
    Conflict(ConflictContext),
    FileDone(FileReport),
    Finished(RunReport),
}

/// Forwards prompts over channels and blocks for the reply. A closed
/// channel counts as Cancel.
pub struct ChannelPrompt {
    events: Sender<RunEvent>,
    decisions: Receiver<Decision>,
}

impl ConflictPrompt for ChannelPrompt {
    fn decide(&mut self, ctx: &ConflictContext) -> Decision {
        if self.events.send(RunEvent::Conflict(ctx.clone())).is_err() {
            return Decision::once(ConflictChoice::Cancel);
        }
        self.decisions
            .recv()
            .unwrap_or(Decision::once(ConflictChoice::Cancel))
    }
}

pub struct RunHandle {
    events: Receiver<RunEvent>,
    decisions: Option<Sender<Decision>>,
    control: RunControl,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl RunHandle {
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Answer the pending conflict. Returns false once the run is gone.
    pub fn decide(&self, decision: Decision) -> bool {
        self.decisions
            .as_ref()
            .is_some_and(|tx| tx.send(decision).is_ok())
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Forget sticky answers before the next file.
    pub fn reset_conflict_choice(&self) {
        self.control.reset_conflict_choice();
    }

    /// Block until the run ends and return its report. Conflicts raised
    /// from here on are answered with Cancel.
    pub fn wait(mut self) -> Option<RunReport> {
        self.decisions = None;
        let mut report = None;
        for event in self.events.iter() {
            if let RunEvent::Finished(r) = event {
                report = Some(r);
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(event = "run_worker_panicked");
            }
        }
        report
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.control.cancel();
        // unblocks a pending prompt
        self.decisions = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(event = "run_worker_panicked");
            }
        }
    }
}

/// Start `run` on its own thread.
pub fn spawn_run(run: ExtractionRun) -> RunHandle {
    let (event_tx, event_rx) = unbounded::<RunEvent>();
    let (decision_tx, decision_rx) = unbounded::<Decision>();
    let control = RunControl::new();
    let worker_control = control.clone();

    let handle = std::thread::spawn(move || {
        let mut prompt = ChannelPrompt {
            events: event_tx.clone(),
            decisions: decision_rx,
        };
        let progress = event_tx.clone();
        let report = run.execute_observed(&mut prompt, &worker_control, &mut |file| {
            // receiver gone: keep going, the report is still produced
            let _ = progress.send(RunEvent::FileDone(file.clone()));
        });
        if event_tx.send(RunEvent::Finished(report)).is_err() {
            tracing::debug!(event = "run_report_dropped");
        }
    });

    RunHandle {
        events: event_rx,
        decisions: Some(decision_tx),
        control,
        handle: Some(handle),
    }
}
