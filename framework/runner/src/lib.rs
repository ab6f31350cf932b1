mod budget;
mod cli;
mod client;
mod config;
mod driver;
mod init;
mod openabl_binary;
mod progress;
mod report;
mod sweep;
mod types;

pub mod prelude {
    pub use crate::budget::{Clock, ManualClock, SystemClock, TimeBudget};
    pub use crate::cli::{CommonArgs, SizeSweepCli, ThreadScalingCli};
    pub use crate::client::{parse_execution_time, OpenAblRunner, RunConfig, RunnerClient};
    pub use crate::config::{
        BenchConfig, ConfigFile, SweepMode, DEFAULT_AGENT_RANGES, DEFAULT_BACKENDS,
        DEFAULT_MODELS, DEFAULT_NUM_TIMESTEPS, DEFAULT_SCALING_MODELS, DEFAULT_SCALING_NUM_AGENTS,
        DMASON_BACKEND, FLAMEGPU_BACKEND,
    };
    pub use crate::driver::{BenchmarkDriver, SweepJob, SweepPlan, SweepStep};
    pub use crate::init::init;
    pub use crate::openabl_binary::{OpenAblInstall, OPENABL_PATH_ENV};
    pub use crate::report::{RunReport, SweepOutcome, SweepStatus};
    pub use crate::sweep::{
        next_pow2, AgentRange, GridPlanner, GridShape, SweepPlanner, DEFAULT_FACTOR,
    };
    pub use crate::types::{BenchError, BenchmarkResult, FailureKind, InvocationError};

    pub use openabl_bench_core::prelude::*;
}
