use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::types::BenchError;

/// Growth factor between two consecutive agent counts of a sweep.
pub const DEFAULT_FACTOR: u64 = 2;

/// An inclusive `min-max` range of agent counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(u64, u64)")]
pub struct AgentRange {
    pub min: u64,
    pub max: u64,
}

impl AgentRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

impl From<(u64, u64)> for AgentRange {
    fn from((min, max): (u64, u64)) -> Self {
        Self::new(min, max)
    }
}

impl FromStr for AgentRange {
    type Err = BenchError;

    /// Parse a `min-max` range such as `250-32000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BenchError::config("Invalid agent number specification (min-max)");

        let (min, max) = s.split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse::<u64>().map_err(|_| invalid())?;
        let max = max.trim().parse::<u64>().map_err(|_| invalid())?;

        Ok(AgentRange::new(min, max))
    }
}

impl fmt::Display for AgentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Plans the geometric sequence of agent counts for one sweep.
///
/// The sequence starts at `min` and multiplies by the factor for as long as the value stays
/// within `max`. A range with `min > max` is a valid sweep with no points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPlanner {
    range: AgentRange,
    factor: u64,
}

impl SweepPlanner {
    pub fn new(range: AgentRange) -> Result<Self, BenchError> {
        Self::with_factor(range, DEFAULT_FACTOR)
    }

    pub fn with_factor(range: AgentRange, factor: u64) -> Result<Self, BenchError> {
        if factor < 2 {
            return Err(BenchError::config(format!(
                "Sweep factor must be at least 2, got {factor}"
            )));
        }
        if range.min == 0 {
            return Err(BenchError::config(
                "Minimum number of agents must be at least 1",
            ));
        }

        Ok(Self { range, factor })
    }

    pub fn range(&self) -> AgentRange {
        self.range
    }

    /// A fresh iterator over the planned agent counts.
    pub fn iter(&self) -> SweepIter {
        SweepIter {
            next: Some(self.range.min),
            max: self.range.max,
            factor: self.factor,
        }
    }
}

impl IntoIterator for &SweepPlanner {
    type Item = u64;
    type IntoIter = SweepIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct SweepIter {
    next: Option<u64>,
    max: u64,
    factor: u64,
}

impl Iterator for SweepIter {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next.filter(|key| *key <= self.max)?;
        self.next = key.checked_mul(self.factor);
        Some(key)
    }
}

/// Rows and columns of the partition grid used by the distributed backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub rows: u64,
    pub cols: u64,
}

impl GridShape {
    /// One thread per grid cell.
    pub fn threads(&self) -> u64 {
        self.rows.saturating_mul(self.cols)
    }
}

/// Plans the grid shapes for a thread scaling sweep.
///
/// Starting from a 1x2 grid, rows and columns are doubled in turn until the next grid would use
/// more threads than the budget. Since the budget is a power of two the final grid uses exactly
/// the whole budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlanner {
    max_threads: u64,
}

impl GridPlanner {
    pub fn new(max_threads: u64) -> Result<Self, BenchError> {
        if !max_threads.is_power_of_two() {
            return Err(BenchError::config(format!(
                "Number of threads must be power of two, got {max_threads}"
            )));
        }

        Ok(Self { max_threads })
    }

    pub fn max_threads(&self) -> u64 {
        self.max_threads
    }

    pub fn iter(&self) -> GridIter {
        GridIter {
            next: GridShape { rows: 1, cols: 2 },
            grow_rows: true,
            max_threads: self.max_threads,
        }
    }
}

impl IntoIterator for &GridPlanner {
    type Item = GridShape;
    type IntoIter = GridIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct GridIter {
    next: GridShape,
    grow_rows: bool,
    max_threads: u64,
}

impl Iterator for GridIter {
    type Item = GridShape;

    fn next(&mut self) -> Option<Self::Item> {
        let shape = self.next;
        if shape.threads() > self.max_threads {
            return None;
        }

        if self.grow_rows {
            self.next.rows = self.next.rows.saturating_mul(2);
        } else {
            self.next.cols = self.next.cols.saturating_mul(2);
        }
        self.grow_rows = !self.grow_rows;

        Some(shape)
    }
}

/// Smallest power of two that is greater than or equal to `n`, or `None` if that does not fit in
/// a `u64`.
///
/// `0` is treated like `1`.
pub fn next_pow2(n: u64) -> Option<u64> {
    n.max(1).checked_next_power_of_two()
}
