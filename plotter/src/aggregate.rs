use std::path::Path;

use anyhow::{bail, Context};
use openabl_bench_core::prelude::{ResultFileName, ResultStore, WorkloadPoint};
use walkdir::WalkDir;

use crate::order::{ordered_by, CANONICAL_BACKENDS, CANONICAL_MODELS, CANONICAL_SCALING_MODELS};

/// Label of the measured curve in scaling charts.
pub const SCALING_LABEL: &str = "DMason";

/// Which result files to read and how to chart them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, derive_more::Display)]
pub enum PlotMode {
    /// `bench_<model>_<backend>.txt` files, one curve per backend.
    #[display("grouped")]
    Grouped,
    /// `scale_<model>.txt` files, one measured curve per model.
    #[display("scaling")]
    Scaling,
}

/// One curve of a chart panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<WorkloadPoint>,
}

/// All curves for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub model: String,
    pub series: Vec<Series>,
}

/// The results found in a directory, in the order they should be charted.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub mode: PlotMode,
    pub panels: Vec<Panel>,
}

impl Aggregation {
    /// Read every result file for `mode` in `dir`.
    ///
    /// Files that belong to the other mode, or are not result files at all, are skipped with a
    /// warning.
    pub fn scan(dir: &Path, mode: PlotMode) -> anyhow::Result<Self> {
        if !dir.is_dir() {
            bail!("Result directory {} does not exist", dir.display());
        }

        let mut panels = Vec::<Panel>::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry =
                entry.with_context(|| format!("Failed to list result directory {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            let (model, label) = match (mode, ResultFileName::parse(&file_name)) {
                (PlotMode::Grouped, ResultFileName::Grouped { model, backend }) => (model, backend),
                (PlotMode::Scaling, ResultFileName::ScalingOnly { model }) => {
                    (model, SCALING_LABEL.to_string())
                }
                _ => {
                    log::warn!("Skipping {file_name}, not a {mode} result file");
                    continue;
                }
            };

            let points = ResultStore::read_from_file(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            log::debug!("Read {} points for {model} from {file_name}", points.len());

            let series = Series { label, points };
            match panels.iter_mut().find(|panel| panel.model == model) {
                Some(panel) => panel.series.push(series),
                None => panels.push(Panel {
                    model,
                    series: vec![series],
                }),
            }
        }

        let canonical_models = match mode {
            PlotMode::Grouped => CANONICAL_MODELS,
            PlotMode::Scaling => CANONICAL_SCALING_MODELS,
        };
        let panels = ordered_by(panels, canonical_models, |panel| panel.model.as_str())
            .into_iter()
            .map(|panel| Panel {
                series: ordered_by(panel.series, CANONICAL_BACKENDS, |series| series.label.as_str()),
                model: panel.model,
            })
            .collect();

        Ok(Self { mode, panels })
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Labels of all curves across panels, in first seen order.
    pub fn series_labels(&self) -> Vec<&str> {
        let mut labels = Vec::<&str>::new();
        for series in self.panels.iter().flat_map(|panel| &panel.series) {
            if !labels.contains(&series.label.as_str()) {
                labels.push(&series.label);
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_should_group_by_model_and_backend() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bench_predator_prey_c.txt", "n,t\n250,0.5\n");
        write(dir.path(), "bench_circle_c.txt", "n,t\n250,1.0\n500,2.0\n");
        write(dir.path(), "bench_circle_mason.txt", "n,t\n250,3.0\n");

        let aggregation = Aggregation::scan(dir.path(), PlotMode::Grouped).unwrap();

        let models = aggregation
            .panels
            .iter()
            .map(|panel| panel.model.as_str())
            .collect::<Vec<_>>();
        assert_eq!(models, vec!["circle", "predator_prey"]);

        let circle = &aggregation.panels[0];
        let backends = circle
            .series
            .iter()
            .map(|series| series.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(backends, vec!["mason", "c"]);
        assert_eq!(
            circle.series[1].points,
            vec![WorkloadPoint::new(250, 1.0), WorkloadPoint::new(500, 2.0)]
        );
        assert_eq!(aggregation.series_labels(), vec!["mason", "c"]);
    }

    #[test]
    fn test_should_skip_files_of_other_mode() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bench_circle_c.txt", "n,t\n250,1.0\n");
        write(dir.path(), "scale_ants.txt", "n,t\n2,8.0\n4,4.0\n");
        write(dir.path(), "notes.md", "nothing to see");
        std::fs::create_dir(dir.path().join("bench_nested_c.txt")).unwrap();

        let grouped = Aggregation::scan(dir.path(), PlotMode::Grouped).unwrap();
        let scaling = Aggregation::scan(dir.path(), PlotMode::Scaling).unwrap();

        assert_eq!(grouped.panels.len(), 1);
        assert_eq!(grouped.panels[0].model, "circle");
        assert_eq!(scaling.panels.len(), 1);
        assert_eq!(scaling.panels[0].model, "ants");
        assert_eq!(scaling.panels[0].series[0].label, SCALING_LABEL);
        assert_eq!(scaling.panels[0].series[0].points.len(), 2);
    }

    #[test]
    fn test_should_keep_valid_rows_of_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bench_ants_flame.txt", "n,t\n250,1.0\n500\n1000,4.0,9\n2000,8.0\n");

        let aggregation = Aggregation::scan(dir.path(), PlotMode::Grouped).unwrap();

        assert_eq!(
            aggregation.panels[0].series[0].points,
            vec![WorkloadPoint::new(250, 1.0), WorkloadPoint::new(2000, 8.0)]
        );
    }

    #[test]
    fn test_should_plot_file_with_undecodable_row() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bench_circle_c.txt"),
            b"n,t\n250,1.0\n\xff\xfe,2.0\n1000,4.0\n",
        )
        .unwrap();
        write(dir.path(), "bench_circle_mason.txt", "n,t\n250,3.0\n");

        let aggregation = Aggregation::scan(dir.path(), PlotMode::Grouped).unwrap();

        let circle = &aggregation.panels[0];
        assert_eq!(circle.series.len(), 2);
        assert_eq!(
            circle.series[1].points,
            vec![WorkloadPoint::new(250, 1.0), WorkloadPoint::new(1000, 4.0)]
        );
    }

    #[test]
    fn test_should_place_unknown_models_last() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scale_zombies.txt", "n,t\n2,1.0\n");
        write(dir.path(), "scale_boids2d_flockers.txt", "n,t\n2,1.0\n");

        let aggregation = Aggregation::scan(dir.path(), PlotMode::Scaling).unwrap();

        let models = aggregation
            .panels
            .iter()
            .map(|panel| panel.model.as_str())
            .collect::<Vec<_>>();
        assert_eq!(models, vec!["boids2d_flockers", "zombies"]);
    }

    #[test]
    fn test_should_fail_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        let result = Aggregation::scan(&dir.path().join("missing"), PlotMode::Grouped);

        assert!(result.is_err());
    }

    #[test]
    fn test_should_return_nothing_for_empty_directory() {
        let dir = tempfile::tempdir().unwrap();

        let aggregation = Aggregation::scan(dir.path(), PlotMode::Grouped).unwrap();

        assert!(aggregation.is_empty());
    }
}
