use std::io;
use std::path::{Path, PathBuf};

use resourcery_channel::StepKind;

/// Undo action for one artifact a succeeded step created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
}

impl Compensation {
    pub fn path(&self) -> &Path {
        match self {
            Compensation::RemoveFile(path) | Compensation::RemoveDir(path) => path,
        }
    }

    fn run(&self) -> io::Result<()> {
        let outcome = match self {
            Compensation::RemoveFile(path) => std::fs::remove_file(path),
            Compensation::RemoveDir(path) => std::fs::remove_dir_all(path),
        };
        match outcome {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Compensations registered by succeeded steps, undone newest first.
///
/// Applied schema changes are never compensated; once the migration runs,
/// the model and migration files are no longer removable either.
#[derive(Debug, Default)]
pub struct CompensationLog {
    entries: Vec<(StepKind, Compensation)>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, step: StepKind, compensation: Compensation) {
        tracing::debug!(step = %step, path = %compensation.path().display(), "compensation registered");
        self.entries.push((step, compensation));
    }

    /// Drop every compensation registered by `step`.
    pub fn forget(&mut self, step: StepKind) {
        self.entries.retain(|(owner, _)| *owner != step);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every compensation in reverse registration order. Failures are
    /// logged and skipped. Returns the compensations that ran.
    pub fn unwind(&mut self) -> Vec<Compensation> {
        let mut undone = Vec::new();
        while let Some((step, compensation)) = self.entries.pop() {
            match compensation.run() {
                Ok(()) => {
                    tracing::info!(
                        event = "compensation_applied",
                        step = %step,
                        path = %compensation.path().display()
                    );
                    undone.push(compensation);
                }
                Err(err) => tracing::warn!(
                    event = "compensation_failed",
                    step = %step,
                    path = %compensation.path().display(),
                    error = %err
                ),
            }
        }
        undone
    }
}
