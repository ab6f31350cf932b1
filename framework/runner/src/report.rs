use std::path::PathBuf;

use openabl_bench_core::prelude::ResultTable;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::types::FailureKind;

/// How a sweep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SweepStatus {
    #[display("completed")]
    Completed,
    #[display("time budget reached")]
    BudgetExhausted,
    #[display("failed: {_0}")]
    Failed(FailureKind),
}

/// The result of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub table: ResultTable,
    pub status: SweepStatus,
    /// Where the table was written, if a result directory was configured.
    pub output: Option<PathBuf>,
}

/// The results of all sweeps of a run, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<SweepOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &SweepOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, SweepStatus::Failed(_)))
    }

    pub fn summary_table(&self) -> String {
        let rows = self.outcomes.iter().map(SweepRow::from).collect::<Vec<_>>();

        let mut table = Table::new(&rows);
        table.with(Style::modern());
        table.to_string()
    }

    pub fn print_summary(&self) {
        println!("\nSummary of sweeps");
        println!("{}", self.summary_table());
    }
}

#[derive(Tabled)]
struct SweepRow {
    backend: String,
    model: String,
    points: usize,
    largest: String,
    status: String,
    output: String,
}

impl From<&SweepOutcome> for SweepRow {
    fn from(outcome: &SweepOutcome) -> Self {
        let table = &outcome.table;
        SweepRow {
            backend: table.backend().to_string(),
            model: table.model().to_string(),
            points: table.len(),
            largest: table
                .points()
                .last()
                .map(|point| point.key.to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: outcome.status.to_string(),
            output: outcome
                .output
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}
