/// A single successful measurement taken during a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadPoint {
    /// The independent variable of the sweep, either an agent count or a thread count.
    pub key: u64,
    /// Execution time reported by the runner, in seconds.
    pub elapsed_seconds: f64,
}

impl WorkloadPoint {
    pub fn new(key: u64, elapsed_seconds: f64) -> Self {
        Self {
            key,
            elapsed_seconds,
        }
    }
}

/// The measurements for one `(backend, model)` pair, in the order they were taken.
///
/// Keys are strictly increasing and every elapsed time is finite and non-negative. A table only
/// ever holds points for invocations that completed successfully, so it may be shorter than the
/// sweep that was planned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    backend: String,
    model: String,
    points: Vec<WorkloadPoint>,
}

impl ResultTable {
    pub fn new(backend: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            model: model.into(),
            points: Vec::new(),
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn points(&self) -> &[WorkloadPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Record a measurement at the end of the table.
    pub fn push(&mut self, point: WorkloadPoint) -> Result<(), ResultTableError> {
        if !point.elapsed_seconds.is_finite() || point.elapsed_seconds < 0.0 {
            return Err(ResultTableError::InvalidElapsed {
                key: point.key,
                elapsed_seconds: point.elapsed_seconds,
            });
        }

        if let Some(last) = self.points.last() {
            if point.key <= last.key {
                return Err(ResultTableError::NonIncreasingKey {
                    previous: last.key,
                    key: point.key,
                });
            }
        }

        self.points.push(point);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ResultTableError {
    #[error("Key {key} does not follow previous key {previous}")]
    NonIncreasingKey { previous: u64, key: u64 },
    #[error("Elapsed time {elapsed_seconds} for key {key} is not a non-negative number")]
    InvalidElapsed { key: u64, elapsed_seconds: f64 },
}
