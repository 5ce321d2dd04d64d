//! Bridge to an external scoring process holding the trained model.
//!
//! The process receives `{"feature_names": [...], "rows": [[...], ...]}` on
//! stdin and answers with a JSON array of probability rows on stdout.

use crate::classifier::{Classifier, PredictionError};
use crate::condition::CONDITION_COUNT;
use log::debug;
use serde::Serialize;
use slope_features::features::{ModelInput, FEATURE_COUNT};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, Serialize)]
struct ScoringRequest<'a> {
    feature_names: [&'static str; FEATURE_COUNT],
    rows: &'a [[f64; FEATURE_COUNT]],
}

/// Runs `program args...` once per call to [`Classifier::predict_proba`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommandClassifier {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        CommandClassifier {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace: the program, then its arguments.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl Classifier for CommandClassifier {
    fn predict_proba(
        &self,
        rows: &[[f64; FEATURE_COUNT]],
    ) -> Result<Vec<[f64; CONDITION_COUNT]>, PredictionError> {
        let request = serde_json::to_vec(&ScoringRequest {
            feature_names: ModelInput::NAMES,
            rows,
        })
        .map_err(|e| PredictionError::Malformed(e.to_string()))?;

        debug!("Scoring {} rows with {}", rows.len(), self.program.display());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                PredictionError::Unavailable(format!("{}: {}", self.program.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PredictionError::Unavailable("stdin was not captured".to_string()))?;
        let writer = thread::spawn(move || stdin.write_all(&request));

        let output = child
            .wait_with_output()
            .map_err(|e| PredictionError::Unavailable(e.to_string()))?;
        let written = writer
            .join()
            .map_err(|_| PredictionError::Unavailable("stdin writer panicked".to_string()))?;

        if !output.status.success() {
            return Err(PredictionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written.map_err(|e| PredictionError::Unavailable(format!("writing rows: {e}")))?;

        serde_json::from_slice::<Vec<[f64; CONDITION_COUNT]>>(&output.stdout)
            .map_err(|e| PredictionError::Malformed(e.to_string()))
    }
}
