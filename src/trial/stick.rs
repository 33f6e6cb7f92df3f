//! Stick-comparison trials.
//!
//! Each trial fuses two oriented sticks and asks which one looks more
//! inclined in depth; the correct answer is the one with the larger
//! interocular inclination.  Conditions are sampled (a fresh pair of
//! distinct inclination levels per trial) rather than crossed, and the
//! results carry their own schema, so this family keeps its own
//! condition type and writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use log::{info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

/// One stick comparison.  Immutable once sampled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickCondition {
    pub trial_id: u32,
    /// Interocular inclination of the left stimulus, degrees.
    pub left_theta: f32,
    /// Interocular inclination of the right stimulus, degrees.
    pub right_theta: f32,
    pub presentation_time: f32,
}

/// Which stimulus the participant judged more inclined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Label written to the results CSV; matches the response keys
    /// (left / right arrow).
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

/// Correct answer: the larger interocular inclination reads as the
/// steeper slant.
pub fn stick_ground_truth(condition: &StickCondition) -> Side {
    if condition.left_theta > condition.right_theta {
        Side::Left
    } else {
        Side::Right
    }
}

/// Sample `n_trials` conditions, each pairing two *distinct*
/// inclination levels drawn from `theta_levels`.  Needs at least two
/// levels; fewer yields an empty list and a warning.
pub fn sample_stick_conditions<R: Rng>(
    theta_levels: &[f32],
    n_trials: usize,
    presentation_time: f32,
    rng: &mut R,
) -> Vec<StickCondition> {
    if theta_levels.len() < 2 {
        warn!(
            "stick trials need at least two inclination levels, got {}",
            theta_levels.len()
        );
        return Vec::new();
    }
    let mut out = Vec::with_capacity(n_trials);
    for i in 0..n_trials {
        // choose_multiple keeps slice order, so shuffle to balance
        // which side gets the steeper stick
        let mut pair: Vec<f32> = theta_levels.choose_multiple(rng, 2).copied().collect();
        pair.shuffle(rng);
        out.push(StickCondition {
            trial_id: i as u32 + 1,
            left_theta: pair[0],
            right_theta: pair[1],
            presentation_time,
        });
    }
    out
}

/// One completed stick trial, ready to serialize.
#[derive(Clone, Debug)]
pub struct StickRecord {
    pub trial_id: u32,
    pub left_theta: f32,
    pub right_theta: f32,
    pub response: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub reaction_time: f32,
}

/// Row-per-trial writer for stick comparisons, flushed per row like
/// [`crate::trial::ResultsWriter`].
pub struct StickResultsWriter {
    out: BufWriter<File>,
    rows: usize,
    correct: usize,
}

impl StickResultsWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "trial_id,left_theta,right_theta,response,correct_answer,\
             is_correct,reaction_time,timestamp"
        )?;
        out.flush()?;
        info!("stick results file: {}", path.display());
        Ok(Self {
            out,
            rows: 0,
            correct: 0,
        })
    }

    pub fn write(&mut self, rec: &StickRecord) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{},{},{:.4},{}",
            rec.trial_id,
            rec.left_theta,
            rec.right_theta,
            rec.response,
            rec.correct_answer,
            rec.is_correct,
            rec.reaction_time,
            Local::now().to_rfc3339(),
        )?;
        self.out.flush()?;
        self.rows += 1;
        if rec.is_correct {
            self.correct += 1;
        }
        Ok(())
    }

    #[inline]
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn accuracy(&self) -> Option<f32> {
        (self.rows > 0).then(|| self.correct as f32 / self.rows as f32)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn the_steeper_stick_is_the_correct_answer() {
        let mut cond = StickCondition {
            trial_id: 1,
            left_theta: 10.0,
            right_theta: 4.0,
            presentation_time: 8.0,
        };
        assert_eq!(stick_ground_truth(&cond), Side::Left);
        cond.left_theta = 2.0;
        assert_eq!(stick_ground_truth(&cond), Side::Right);
    }

    #[test]
    fn sampled_pairs_are_distinct_levels() {
        let levels = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let trials =
            sample_stick_conditions(&levels, 40, 8.0, &mut StdRng::seed_from_u64(5));
        assert_eq!(trials.len(), 40);
        for (i, t) in trials.iter().enumerate() {
            assert_eq!(t.trial_id, i as u32 + 1);
            assert_ne!(t.left_theta, t.right_theta);
            assert!(levels.contains(&t.left_theta));
            assert!(levels.contains(&t.right_theta));
        }
    }

    #[test]
    fn too_few_levels_yields_no_trials() {
        let trials =
            sample_stick_conditions(&[5.0], 10, 8.0, &mut StdRng::seed_from_u64(5));
        assert!(trials.is_empty());
    }

    #[test]
    fn stick_rows_land_on_disk_immediately() {
        let dir = std::env::temp_dir().join("stereolab_stick_results");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("results.csv");

        let mut w = StickResultsWriter::create(&path).unwrap();
        w.write(&StickRecord {
            trial_id: 1,
            left_theta: 10.0,
            right_theta: 4.0,
            response: "LEFT".into(),
            correct_answer: "LEFT".into(),
            is_correct: true,
            reaction_time: 1.5,
        })
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("trial_id,left_theta,"));
        assert!(lines[1].starts_with("1,10,4,LEFT,LEFT,true,"));
        assert_eq!(w.accuracy(), Some(1.0));
        std::fs::remove_dir_all(&dir).ok();
    }
}
