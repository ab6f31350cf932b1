use std::io::{self, Write};

use indicatif::{ProgressBar, ProgressStyle};

/// Progress of the sweep that is currently running, shown as a bar with one step per point.
///
/// Measurement lines always go to stdout. The bar is cleared while a line is written and
/// redrawn after it, so the two never interleave.
pub struct SweepProgress {
    bar: ProgressBar,
}

impl SweepProgress {
    pub fn start(enabled: bool, planned_points: u64, message: String) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(planned_points);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} points [{elapsed_precise}] {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(message);

        Self { bar }
    }

    /// Print a measurement line to stdout, with the bar cleared while it is written.
    pub fn println(&self, line: &str) {
        if let Err(err) = self.write_line(io::stdout().lock(), line) {
            log::warn!("Failed to print measurement '{line}': {err}");
        }
    }

    fn write_line<W: Write>(&self, mut out: W, line: &str) -> io::Result<()> {
        self.bar.suspend(|| {
            writeln!(out, "{line}")?;
            out.flush()
        })
    }

    pub fn point_done(&self) {
        self.bar.inc(1);
    }

    pub fn finish(self) {
        log::trace!("Sweep progress finished at {}", self.bar.position());
        self.bar.finish_and_clear();
    }
}
