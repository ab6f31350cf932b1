use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::sweep::AgentRange;
use crate::types::BenchError;

/// Backend of the distributed D-Mason simulator, the only one thread scaling sweeps run on.
pub const DMASON_BACKEND: &str = "dmason";

/// Backend that needs its agent buffer sized to a power of two.
pub const FLAMEGPU_BACKEND: &str = "flamegpu";

pub const DEFAULT_BACKENDS: &[&str] = &["c", "mason", "flame", "flamegpu"];

pub const DEFAULT_MODELS: &[&str] = &[
    "circle",
    "boids2d",
    "game_of_life",
    "sugarscape",
    "ants",
    "predator_prey",
];

/// Models for thread scaling. D-Mason has its own port of the boids model.
pub const DEFAULT_SCALING_MODELS: &[&str] = &[
    "circle",
    "boids2d_flockers",
    "game_of_life",
    "sugarscape",
    "ants",
    "predator_prey",
];

pub const DEFAULT_AGENT_RANGES: &[(&str, AgentRange)] = &[
    ("c", AgentRange::new(250, 32000)),
    ("mason", AgentRange::new(250, 128000)),
    ("mason2", AgentRange::new(250, 128000)),
    ("dmason", AgentRange::new(250, 128000)),
    ("flame", AgentRange::new(250, 4000)),
    ("flamegpu", AgentRange::new(250, 10240000)),
];

pub const DEFAULT_NUM_TIMESTEPS: u64 = 100;

pub const DEFAULT_SCALING_NUM_AGENTS: u64 = 100000;

/// Environment variables that a backend cannot be benchmarked without, with a hint for the user.
pub const REQUIRED_ENV: &[(&str, &str, &str)] = &[(
    FLAMEGPU_BACKEND,
    "SMS",
    "When using flamegpu the SM architecture must be specified using the SMS environment variable (e.g. SMS=52)",
)];

/// Model parameters that must be overridden for a model to behave sensibly on a backend.
pub const MODEL_PARAM_OVERRIDES: &[(&str, &str, &str, &str)] = &[
    // The default parametrization of predator_prey works really badly for D-Mason
    (DMASON_BACKEND, "predator_prey", "SPACE_MULT", "128"),
];

/// What kind of sweep to run for each selected model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Grow the agent count through each backend's agent range.
    SizeSweep,
    /// Run a fixed number of agents on D-Mason with a growing number of threads.
    ThreadScaling { max_threads: u64, num_agents: u64 },
}

/// Everything the benchmark driver needs to know, resolved once before the run starts.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub mode: SweepMode,
    pub backends: Vec<String>,
    pub models: Vec<String>,
    /// Used for every backend instead of its default range when set.
    pub agent_range: Option<AgentRange>,
    pub default_ranges: BTreeMap<String, AgentRange>,
    pub num_timesteps: u64,
    /// Approximate wall clock time allowed per sweep.
    pub max_time: Option<Duration>,
    /// Results are only printed when this is not set.
    pub result_dir: Option<PathBuf>,
    /// Snapshot of the environment variables listed in [`REQUIRED_ENV`].
    pub environment: BTreeMap<String, String>,
    pub show_progress: bool,
}

impl BenchConfig {
    /// Configuration for agent count sweeps over the default backends and models.
    pub fn size_sweep() -> Self {
        Self {
            mode: SweepMode::SizeSweep,
            backends: to_strings(DEFAULT_BACKENDS),
            models: to_strings(DEFAULT_MODELS),
            agent_range: None,
            default_ranges: DEFAULT_AGENT_RANGES
                .iter()
                .map(|(backend, range)| (backend.to_string(), *range))
                .collect(),
            num_timesteps: DEFAULT_NUM_TIMESTEPS,
            max_time: None,
            result_dir: None,
            environment: BTreeMap::new(),
            show_progress: true,
        }
    }

    /// Configuration for D-Mason thread scaling sweeps up to `max_threads`.
    pub fn thread_scaling(max_threads: u64) -> Self {
        Self {
            mode: SweepMode::ThreadScaling {
                max_threads,
                num_agents: DEFAULT_SCALING_NUM_AGENTS,
            },
            backends: vec![DMASON_BACKEND.to_string()],
            models: to_strings(DEFAULT_SCALING_MODELS),
            ..Self::size_sweep()
        }
    }

    /// Builds a [`BenchConfig`] with the specified backends, if any.
    pub fn backends(mut self, backends: Option<Vec<String>>) -> Self {
        if let Some(backends) = backends {
            self.backends = backends;
        }
        self
    }

    /// Builds a [`BenchConfig`] with the specified models, if any.
    pub fn models(mut self, models: Option<Vec<String>>) -> Self {
        if let Some(models) = models {
            self.models = models;
        }
        self
    }

    /// Builds a [`BenchConfig`] with an agent range for all backends.
    pub fn agent_range(mut self, range: Option<AgentRange>) -> Self {
        if range.is_some() {
            self.agent_range = range;
        }
        self
    }

    /// Builds a [`BenchConfig`] with the number of agents for thread scaling.
    pub fn scaling_num_agents(mut self, agents: u64) -> Self {
        if let SweepMode::ThreadScaling { num_agents, .. } = &mut self.mode {
            *num_agents = agents;
        }
        self
    }

    /// Builds a [`BenchConfig`] with the specified number of timesteps.
    pub fn num_timesteps(mut self, num_timesteps: Option<u64>) -> Self {
        if let Some(num_timesteps) = num_timesteps {
            self.num_timesteps = num_timesteps;
        }
        self
    }

    /// Builds a [`BenchConfig`] with the specified per sweep time budget in seconds.
    pub fn max_time(mut self, max_time_secs: Option<u64>) -> Self {
        if let Some(secs) = max_time_secs {
            self.max_time = Some(Duration::from_secs(secs));
        }
        self
    }

    /// Builds a [`BenchConfig`] that writes results to the specified directory.
    pub fn result_dir(mut self, result_dir: Option<PathBuf>) -> Self {
        if result_dir.is_some() {
            self.result_dir = result_dir;
        }
        self
    }

    /// Builds a [`BenchConfig`] with one captured environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.environment.insert(key.to_string(), value.to_string());
        self
    }

    /// Builds a [`BenchConfig`] with the variables from [`REQUIRED_ENV`] read from the process
    /// environment.
    pub fn capture_env(mut self) -> Self {
        for (_, key, _) in REQUIRED_ENV {
            if let Ok(value) = std::env::var(key) {
                self.environment.insert(key.to_string(), value);
            }
        }
        self
    }

    /// Builds a [`BenchConfig`] with or without a progress bar.
    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The agent range to sweep for a backend.
    pub fn range_for(&self, backend: &str) -> Result<AgentRange, BenchError> {
        if let Some(range) = self.agent_range {
            return Ok(range);
        }

        self.default_ranges.get(backend).copied().ok_or_else(|| {
            BenchError::config(format!(
                "No default agent range for backend '{backend}', specify one with --num-agents"
            ))
        })
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Optional TOML file with settings for size sweeps.
///
/// ```toml
/// backends = ["c", "mason"]
/// models = ["circle"]
/// num_timesteps = 50
/// max_time = 600
///
/// [agent_ranges]
/// c = [250, 64000]
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub backends: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub num_timesteps: Option<u64>,
    pub max_time: Option<u64>,
    #[serde(default)]
    pub agent_ranges: BTreeMap<String, AgentRange>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&content).map_err(|e| match e {
            BenchError::Configuration(msg) => {
                BenchError::config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, BenchError> {
        toml::from_str(content)
            .map_err(|e| BenchError::config(format!("Invalid config file: {e}")))
    }

    /// Lay the file's settings over `config`.
    ///
    /// Agent ranges are merged into the default table, everything else replaces the value in
    /// `config`.
    pub fn apply(self, mut config: BenchConfig) -> BenchConfig {
        config.default_ranges.extend(self.agent_ranges);
        config
            .backends(self.backends)
            .models(self.models)
            .num_timesteps(self.num_timesteps)
            .max_time(self.max_time)
    }
}
