//! Incremental results persistence.
//!
//! One CSV row per completed trial, flushed as soon as it is written:
//! an abort (or a crash later in the run) can never lose judgements
//! already collected.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use log::info;

/// One completed trial, ready to serialize.
#[derive(Clone, Debug)]
pub struct TrialRecord {
    pub trial_id: u32,
    pub disparity_degrees: f32,
    pub distance_along_vector: f32,
    pub onplane: bool,
    pub response: String,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Seconds from stimulus onset to the response key.
    pub reaction_time: f32,
}

pub struct ResultsWriter {
    out: BufWriter<File>,
    rows: usize,
    correct: usize,
}

impl ResultsWriter {
    /// Create the file and write the header row immediately.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "trial_id,disparity_degrees,distance_along_vector,onplane,\
             response,correct_answer,is_correct,reaction_time,timestamp"
        )?;
        out.flush()?;
        info!("results file: {}", path.display());
        Ok(Self {
            out,
            rows: 0,
            correct: 0,
        })
    }

    /// Append one row and flush it to disk.
    pub fn write(&mut self, rec: &TrialRecord) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{:.4},{}",
            rec.trial_id,
            rec.disparity_degrees,
            rec.distance_along_vector,
            rec.onplane,
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

    /// Fraction of correct rows so far, if any were written.
    pub fn accuracy(&self) -> Option<f32> {
        (self.rows > 0).then(|| self.correct as f32 / self.rows as f32)
    }
}
