//! Trial sequencing and bookkeeping.
//!
//! The controller owns the shuffled condition list and the results
//! writer.  It hands out each condition exactly once, derives the
//! ground truth for the depth judgement, and records responses as they
//! arrive.  Presentation itself (windows, key polling, timing) lives in
//! the binaries; the controller stays display-agnostic.

use log::{info, warn};

use crate::trial::conditions::TrialCondition;
use crate::trial::results::{ResultsWriter, TrialRecord};

/// The participant's depth judgement (also the ground-truth space).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgement {
    Above,
    Below,
    OnPlane,
}

impl Judgement {
    /// Label written to the results CSV; matches the response key hints
    /// shown to the participant (W / S / SPACE).
    pub fn label(self) -> &'static str {
        match self {
            Judgement::Above => "W",
            Judgement::Below => "S",
            Judgement::OnPlane => "SPACE",
        }
    }
}

/// Correct answer for one condition: on-plane trials expect `OnPlane`,
/// otherwise the column's world y decides above vs below.
pub fn ground_truth(condition: &TrialCondition, column_world_y: f32) -> Judgement {
    if condition.onplane {
        Judgement::OnPlane
    } else if column_world_y > 0.0 {
        Judgement::Above
    } else {
        Judgement::Below
    }
}

/// What ended one trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrialOutcome {
    /// Response key with reaction time in seconds from stimulus onset.
    Responded(Judgement, f32),
    /// Escape pressed; abort the run, keep what was collected.
    Aborted,
    /// Trial could not be presented (e.g. missing geometry); skipped.
    Skipped,
}

pub struct TrialController {
    trials: Vec<TrialCondition>,
    next: usize,
    writer: ResultsWriter,
    skipped: usize,
}

impl TrialController {
    pub fn new(trials: Vec<TrialCondition>, writer: ResultsWriter) -> Self {
        info!("trial controller ready: {} trials queued", trials.len());
        Self {
            trials,
            next: 0,
            writer,
            skipped: 0,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.trials.len()
    }

    #[inline]
    pub fn presented(&self) -> usize {
        self.next
    }

    /// Draw the next condition, consuming it.  `None` once exhausted.
    pub fn next_trial(&mut self) -> Option<TrialCondition> {
        let t = self.trials.get(self.next).copied()?;
        self.next += 1;
        Some(t)
    }

    /// Record one finished trial.  Skips and aborts write no row;
    /// skips are counted and logged instead of retried.
    pub fn record(
        &mut self,
        condition: &TrialCondition,
        truth: Judgement,
        outcome: TrialOutcome,
    ) -> std::io::Result<()> {
        match outcome {
            TrialOutcome::Responded(judgement, reaction_time) => {
                self.writer.write(&TrialRecord {
                    trial_id: condition.trial_id,
                    disparity_degrees: condition.disparity_degrees,
                    distance_along_vector: condition.distance_along_vector,
                    onplane: condition.onplane,
                    response: judgement.label().to_string(),
                    correct_answer: truth.label().to_string(),
                    is_correct: judgement == truth,
                    reaction_time,
                })
            }
            TrialOutcome::Skipped => {
                self.skipped += 1;
                warn!(
                    "trial {} skipped (distance {})",
                    condition.trial_id, condition.distance_along_vector
                );
                Ok(())
            }
            TrialOutcome::Aborted => Ok(()),
        }
    }

    /// Log the end-of-run (or abort) summary.  Rows were flushed as
    /// they were written, so there is nothing left to persist.
    pub fn finish(&self, aborted: bool) {
        let done = self.writer.rows_written();
        if aborted {
            warn!(
                "run aborted: {done}/{} trials recorded, {} skipped",
                self.total(),
                self.skipped
            );
        } else {
            info!(
                "run complete: {done}/{} trials recorded, {} skipped",
                self.total(),
                self.skipped
            );
        }
        if let Some(acc) = self.writer.accuracy() {
            info!("accuracy: {:.1}%", acc * 100.0);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
