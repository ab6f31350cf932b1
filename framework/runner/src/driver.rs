use openabl_bench_core::prelude::{format_elapsed, ResultKind, ResultStore, ResultTable, WorkloadPoint};

use crate::budget::{Clock, TimeBudget};
use crate::client::{RunConfig, RunnerClient};
use crate::config::{
    BenchConfig, SweepMode, FLAMEGPU_BACKEND, MODEL_PARAM_OVERRIDES, REQUIRED_ENV,
};
use crate::progress::SweepProgress;
use crate::report::{RunReport, SweepOutcome, SweepStatus};
use crate::sweep::{next_pow2, GridPlanner, GridShape, SweepPlanner};
use crate::types::{BenchError, FailureKind};

/// The points planned for one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepPlan {
    /// Growing agent counts with a fixed thread layout.
    Agents(SweepPlanner),
    /// Growing thread grids with a fixed agent count.
    Threads { grid: GridPlanner, num_agents: u64 },
}

/// One point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStep {
    /// The value recorded as the key of the measurement.
    pub key: u64,
    pub num_agents: u64,
    pub grid: Option<GridShape>,
}

impl SweepPlan {
    pub fn steps(&self) -> Box<dyn Iterator<Item = SweepStep> + '_> {
        match self {
            SweepPlan::Agents(planner) => Box::new(planner.iter().map(|num_agents| SweepStep {
                key: num_agents,
                num_agents,
                grid: None,
            })),
            SweepPlan::Threads { grid, num_agents } => {
                let num_agents = *num_agents;
                Box::new(grid.iter().map(move |shape| SweepStep {
                    key: shape.threads(),
                    num_agents,
                    grid: Some(shape),
                }))
            }
        }
    }

    /// The largest agent count of any step, `None` when there are no steps.
    pub fn max_agents(&self) -> Option<u64> {
        self.steps().map(|step| step.num_agents).max()
    }

    pub fn result_kind(&self) -> ResultKind {
        match self {
            SweepPlan::Agents(_) => ResultKind::SizeSweep,
            SweepPlan::Threads { .. } => ResultKind::ThreadScaling,
        }
    }

    fn describe(&self) -> String {
        match self {
            SweepPlan::Agents(planner) => format!("{} agents", planner.range()),
            SweepPlan::Threads { grid, num_agents } => {
                format!("2-{} threads and {num_agents} agents", grid.max_threads())
            }
        }
    }
}

/// A sweep to run for one `(backend, model)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepJob {
    pub backend: String,
    pub model: String,
    pub plan: SweepPlan,
}

/// Runs the sweeps selected by a [BenchConfig], one invocation at a time.
///
/// A failed invocation ends its own sweep but not the run. Whatever a sweep measured before it
/// ended is kept and written to the result directory.
pub struct BenchmarkDriver<R, C> {
    config: BenchConfig,
    client: R,
    clock: C,
}

impl<R, C> BenchmarkDriver<R, C>
where
    R: RunnerClient,
    C: Clock,
{
    pub fn new(config: BenchConfig, client: R, clock: C) -> Self {
        Self {
            config,
            client,
            clock,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn client(&self) -> &R {
        &self.client
    }

    /// Check the configuration and work out every sweep of the run, backend by backend.
    ///
    /// Any problem with the configuration is reported here, before anything has been run.
    pub fn plan(&self) -> Result<Vec<SweepJob>, BenchError> {
        let config = &self.config;
        if config.backends.is_empty() {
            return Err(BenchError::config("No backends selected"));
        }
        if config.models.is_empty() {
            return Err(BenchError::config("No models selected"));
        }

        for (backend, key, hint) in REQUIRED_ENV {
            if config.backends.iter().any(|b| b == *backend)
                && !config.environment.contains_key(*key)
            {
                return Err(BenchError::config(*hint));
            }
        }

        let mut jobs = Vec::with_capacity(config.backends.len() * config.models.len());
        for backend in &config.backends {
            let plan = match config.mode {
                SweepMode::SizeSweep => SweepPlan::Agents(SweepPlanner::new(config.range_for(backend)?)?),
                SweepMode::ThreadScaling {
                    max_threads,
                    num_agents,
                } => SweepPlan::Threads {
                    grid: GridPlanner::new(max_threads)?,
                    num_agents,
                },
            };

            if backend == FLAMEGPU_BACKEND {
                if let Some(agents) = plan.max_agents().filter(|n| next_pow2(*n).is_none()) {
                    return Err(BenchError::config(format!(
                        "{agents} agents is too many for the {FLAMEGPU_BACKEND} buffer size"
                    )));
                }
            }

            for model in &config.models {
                jobs.push(SweepJob {
                    backend: backend.clone(),
                    model: model.clone(),
                    plan: plan.clone(),
                });
            }
        }

        Ok(jobs)
    }

    /// Plan and run all sweeps.
    pub fn run(&mut self) -> Result<RunReport, BenchError> {
        let jobs = self.plan()?;
        self.run_jobs(&jobs)
    }

    /// Run already planned sweeps in order.
    pub fn run_jobs(&mut self, jobs: &[SweepJob]) -> Result<RunReport, BenchError> {
        let store = self.config.result_dir.clone().map(ResultStore::new);
        if store.is_none() {
            log::warn!("No result directory specified, results will only be printed");
        }

        let mut report = RunReport::default();
        for job in jobs {
            let mut outcome = self.run_sweep(job);
            if let Some(store) = &store {
                outcome.output = Some(store.write(&outcome.table, job.plan.result_kind())?);
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// The parameters for one point of a sweep, including anything the backend derives from it.
    pub fn run_config(&self, job: &SweepJob, step: &SweepStep) -> RunConfig {
        let mut run_config = RunConfig::new(step.num_agents, self.config.num_timesteps);

        if job.backend == FLAMEGPU_BACKEND {
            if let Some(buffer_size) = next_pow2(step.num_agents) {
                run_config = run_config.config("flamegpu.buffer_size", buffer_size);
            }
        }

        if let Some(grid) = step.grid {
            run_config = run_config
                .config(&format!("{}.grid_rows", job.backend), grid.rows)
                .config(&format!("{}.grid_cols", job.backend), grid.cols);
        }

        for (backend, model, key, value) in MODEL_PARAM_OVERRIDES {
            if job.backend == *backend && job.model == *model {
                run_config = run_config.param(key, value);
            }
        }

        run_config
    }

    fn run_sweep(&mut self, job: &SweepJob) -> SweepOutcome {
        log::info!(
            "Running {} on {} backend with {}",
            job.model,
            job.backend,
            job.plan.describe()
        );

        let budget = self.config.max_time.map(TimeBudget::new);
        let progress = SweepProgress::start(
            self.config.show_progress,
            job.plan.steps().count() as u64,
            format!("{} on {}", job.model, job.backend),
        );

        let mut table = ResultTable::new(&job.backend, &job.model);
        let mut status = SweepStatus::Completed;
        let sweep_start = self.clock.now();

        let mut steps = job.plan.steps().peekable();
        while let Some(step) = steps.next() {
            let point_start = self.clock.now();
            let run_config = self.run_config(job, &step);

            let elapsed = match self.client.invoke(&job.model, &job.backend, &run_config) {
                Ok(elapsed) => elapsed,
                Err(err) => {
                    log::error!("{err}");
                    status = SweepStatus::Failed(err.kind());
                    break;
                }
            };

            if let Err(err) = table.push(WorkloadPoint::new(step.key, elapsed)) {
                log::error!(
                    "Invalid measurement for {} on {}: {err}",
                    job.model,
                    job.backend
                );
                status = SweepStatus::Failed(FailureKind::MetricParseFailed);
                break;
            }
            progress.println(&format!("{},{}", step.key, format_elapsed(elapsed)));
            progress.point_done();

            if let Some(budget) = &budget {
                let now = self.clock.now();
                let sweep_elapsed = now.saturating_sub(sweep_start);
                let last_point = now.saturating_sub(point_start);
                if steps.peek().is_some() && budget.is_exhausted(sweep_elapsed, last_point) {
                    log::info!(
                        "Stopping {} on {} after {:.1}s, the next point would exceed the time budget of {}s",
                        job.model,
                        job.backend,
                        sweep_elapsed.as_secs_f64(),
                        budget.limit().as_secs()
                    );
                    status = SweepStatus::BudgetExhausted;
                    break;
                }
            }
        }

        progress.finish();

        SweepOutcome {
            table,
            status,
            output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::budget::ManualClock;
    use crate::sweep::AgentRange;
    use crate::types::InvocationError;

    struct NeverRun;

    impl RunnerClient for NeverRun {
        fn invoke(&mut self, _: &str, _: &str, _: &RunConfig) -> Result<f64, InvocationError> {
            panic!("Nothing should run while planning");
        }
    }

    fn driver(config: BenchConfig) -> BenchmarkDriver<NeverRun, ManualClock> {
        BenchmarkDriver::new(config.show_progress(false), NeverRun, ManualClock::new())
    }

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_should_plan_backend_major_order() {
        let config = BenchConfig::size_sweep()
            .backends(strings(&["c", "mason"]))
            .models(strings(&["circle", "ants"]));

        let jobs = driver(config).plan().unwrap();

        let order = jobs
            .iter()
            .map(|job| (job.backend.as_str(), job.model.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                ("c", "circle"),
                ("c", "ants"),
                ("mason", "circle"),
                ("mason", "ants")
            ]
        );
        assert_eq!(
            jobs[0].plan,
            SweepPlan::Agents(SweepPlanner::new(AgentRange::new(250, 32000)).unwrap())
        );
        assert_eq!(
            jobs[2].plan,
            SweepPlan::Agents(SweepPlanner::new(AgentRange::new(250, 128000)).unwrap())
        );
    }

    #[test]
    fn test_should_reject_backend_without_range_before_running() {
        let config = BenchConfig::size_sweep().backends(strings(&["c", "repast"]));

        let err = driver(config).plan().unwrap_err();

        assert!(matches!(err, BenchError::Configuration(_)));
    }

    #[test]
    fn test_should_require_sms_for_flamegpu() {
        let config = BenchConfig::size_sweep().backends(strings(&["c", "flamegpu"]));

        let err = driver(config.clone()).plan().unwrap_err();
        assert!(err.to_string().contains("SMS"));

        let jobs = driver(config.env("SMS", "52")).plan().unwrap();
        assert_eq!(jobs.len(), 12);
    }

    #[test]
    fn test_should_reject_flamegpu_range_beyond_largest_buffer() {
        let config = BenchConfig::size_sweep()
            .backends(strings(&["flamegpu"]))
            .agent_range(Some(AgentRange::new(u64::MAX / 2 + 2, u64::MAX)))
            .env("SMS", "52");

        let err = driver(config).plan().unwrap_err();

        assert!(matches!(err, BenchError::Configuration(_)));
    }

    #[test]
    fn test_should_allow_large_range_on_other_backends() {
        let config = BenchConfig::size_sweep()
            .backends(strings(&["c"]))
            .agent_range(Some(AgentRange::new(u64::MAX / 2 + 2, u64::MAX)));

        let jobs = driver(config).plan().unwrap();

        assert_eq!(jobs[0].plan.max_agents(), Some(u64::MAX / 2 + 2));
    }

    #[test]
    fn test_should_reject_empty_selection() {
        assert!(driver(BenchConfig::size_sweep().backends(Some(vec![])))
            .plan()
            .is_err());
        assert!(driver(BenchConfig::size_sweep().models(Some(vec![])))
            .plan()
            .is_err());
    }

    #[test]
    fn test_should_reject_non_power_of_two_threads() {
        let err = driver(BenchConfig::thread_scaling(12)).plan().unwrap_err();

        assert!(matches!(err, BenchError::Configuration(_)));
    }

    #[test]
    fn test_should_plan_thread_scaling_steps() {
        let jobs = driver(BenchConfig::thread_scaling(8).scaling_num_agents(1000))
            .plan()
            .unwrap();

        assert_eq!(jobs.len(), 6);
        assert!(jobs.iter().all(|job| job.backend == "dmason"));
        let steps = jobs[0].plan.steps().collect::<Vec<_>>();
        assert_eq!(
            steps.iter().map(|s| s.key).collect::<Vec<_>>(),
            vec![2, 4, 8]
        );
        assert!(steps.iter().all(|s| s.num_agents == 1000));
        assert_eq!(jobs[0].plan.result_kind(), ResultKind::ThreadScaling);
    }

    #[test]
    fn test_should_derive_flamegpu_buffer_size() {
        let driver = driver(BenchConfig::size_sweep().env("SMS", "52"));
        let job = SweepJob {
            backend: "flamegpu".to_string(),
            model: "circle".to_string(),
            plan: SweepPlan::Agents(SweepPlanner::new(AgentRange::new(250, 1000)).unwrap()),
        };
        let step = SweepStep {
            key: 1000,
            num_agents: 1000,
            grid: None,
        };

        let run_config = driver.run_config(&job, &step);

        assert_eq!(
            run_config,
            RunConfig::new(1000, 100).config("flamegpu.buffer_size", 1024)
        );
    }

    #[test]
    fn test_should_derive_grid_and_model_overrides_for_dmason() {
        let driver = driver(BenchConfig::thread_scaling(16));
        let job = SweepJob {
            backend: "dmason".to_string(),
            model: "predator_prey".to_string(),
            plan: SweepPlan::Threads {
                grid: GridPlanner::new(16).unwrap(),
                num_agents: 100000,
            },
        };
        let step = job.plan.steps().nth(2).unwrap();

        let run_config = driver.run_config(&job, &step);

        assert_eq!(step.key, 8);
        assert_eq!(
            run_config,
            RunConfig::new(100000, 100)
                .config("dmason.grid_rows", 2)
                .config("dmason.grid_cols", 4)
                .param("SPACE_MULT", 128)
        );
    }

    #[test]
    fn test_should_not_override_params_for_other_models() {
        let driver = driver(BenchConfig::thread_scaling(2));
        let job = SweepJob {
            backend: "dmason".to_string(),
            model: "circle".to_string(),
            plan: SweepPlan::Threads {
                grid: GridPlanner::new(2).unwrap(),
                num_agents: 100,
            },
        };
        let step = job.plan.steps().next().unwrap();

        assert!(driver.run_config(&job, &step).params.is_empty());
    }
}
