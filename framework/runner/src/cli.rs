use std::path::{Path, PathBuf};

use clap::{Args, Parser};

use crate::config::{BenchConfig, ConfigFile};
use crate::sweep::AgentRange;
use crate::types::BenchError;

/// Options shared by every benchmark binary.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Directory to write one result file per backend and model to.
    ///
    /// If omitted, measurements are only printed.
    #[clap(short = 'r', long)]
    pub result_dir: Option<PathBuf>,

    /// Approximate maximum time in seconds to spend on each sweep
    #[clap(short = 'M', long)]
    pub max_time: Option<u64>,

    /// The number of timesteps to simulate for every point
    #[clap(short = 'T', long)]
    pub num_timesteps: Option<u64>,

    /// The OpenABL checkout to run, containing the `OpenABL` binary, `examples/` and `asset/`.
    ///
    /// The binary can also be set directly with the `OPENABL_PATH` environment variable.
    #[clap(long, default_value = ".")]
    pub openabl_dir: PathBuf,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

impl CommonArgs {
    fn apply(&self, config: BenchConfig) -> BenchConfig {
        config
            .num_timesteps(self.num_timesteps)
            .max_time(self.max_time)
            .result_dir(self.result_dir.clone())
            .show_progress(!self.no_progress)
    }
}

/// Run every selected model on every selected backend with a growing number of agents.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct SizeSweepCli {
    /// Backends to benchmark, comma separated
    #[clap(short, long, value_delimiter = ',')]
    pub backends: Option<Vec<String>>,

    /// Models to benchmark, comma separated
    #[clap(short, long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Agent range to sweep for every backend, in the format `min-max`.
    ///
    /// Each backend has its own default range, this replaces all of them.
    #[clap(short = 'n', long, value_parser = parse_agent_range)]
    pub num_agents: Option<AgentRange>,

    /// A TOML file with backends, models, timesteps, time budget and agent ranges.
    ///
    /// Flags given on the command line take precedence over the file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl SizeSweepCli {
    pub fn bench_config(&self) -> Result<BenchConfig, BenchError> {
        let mut config = BenchConfig::size_sweep().capture_env();
        if let Some(path) = &self.config {
            config = ConfigFile::load(path)?.apply(config);
        }

        let config = config
            .backends(self.backends.clone())
            .models(self.models.clone())
            .agent_range(self.num_agents);

        Ok(self.common.apply(config))
    }

    pub fn openabl_dir(&self) -> &Path {
        &self.common.openabl_dir
    }
}

/// Run every selected model on D-Mason with a fixed number of agents and a growing number of
/// threads.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct ThreadScalingCli {
    /// The largest number of threads to run with, must be a power of two
    #[clap(short = 't', long)]
    pub max_threads: u64,

    /// Models to benchmark, comma separated
    #[clap(short, long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// The number of agents to run every point with
    #[clap(short = 'n', long)]
    pub num_agents: Option<u64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ThreadScalingCli {
    pub fn bench_config(&self) -> BenchConfig {
        let mut config = BenchConfig::thread_scaling(self.max_threads)
            .capture_env()
            .models(self.models.clone());
        if let Some(num_agents) = self.num_agents {
            config = config.scaling_num_agents(num_agents);
        }

        self.common.apply(config)
    }

    pub fn openabl_dir(&self) -> &Path {
        &self.common.openabl_dir
    }
}

fn parse_agent_range(s: &str) -> anyhow::Result<AgentRange> {
    Ok(s.parse::<AgentRange>()?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{SweepMode, DEFAULT_SCALING_NUM_AGENTS};

    #[test]
    fn test_should_parse_size_sweep_flags() {
        let cli = SizeSweepCli::parse_from([
            "size-sweep",
            "-b",
            "c,mason",
            "-m",
            "circle",
            "-n",
            "250-1000",
            "-r",
            "results",
            "-M",
            "60",
            "-T",
            "10",
            "--no-progress",
        ]);

        let config = cli.bench_config().unwrap();

        assert_eq!(config.backends, vec!["c", "mason"]);
        assert_eq!(config.models, vec!["circle"]);
        assert_eq!(config.agent_range, Some(AgentRange::new(250, 1000)));
        assert_eq!(config.result_dir, Some(PathBuf::from("results")));
        assert_eq!(config.max_time, Some(Duration::from_secs(60)));
        assert_eq!(config.num_timesteps, 10);
        assert!(!config.show_progress);
        assert_eq!(cli.openabl_dir(), Path::new("."));
    }

    #[test]
    fn test_should_reject_malformed_agent_range() {
        let result = SizeSweepCli::try_parse_from(["size-sweep", "-n", "250"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_should_prefer_flags_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(
            &path,
            "backends = [\"flame\"]\nmodels = [\"ants\"]\nnum_timesteps = 50\n",
        )
        .unwrap();

        let cli = SizeSweepCli::parse_from([
            "size-sweep",
            "--config",
            path.to_str().unwrap(),
            "-m",
            "circle",
        ]);
        let config = cli.bench_config().unwrap();

        assert_eq!(config.backends, vec!["flame"]);
        assert_eq!(config.models, vec!["circle"]);
        assert_eq!(config.num_timesteps, 50);
    }

    #[test]
    fn test_should_parse_thread_scaling_flags() {
        let cli = ThreadScalingCli::parse_from(["thread-scaling", "-t", "16", "-m", "ants"]);

        let config = cli.bench_config();

        assert_eq!(
            config.mode,
            SweepMode::ThreadScaling {
                max_threads: 16,
                num_agents: DEFAULT_SCALING_NUM_AGENTS
            }
        );
        assert_eq!(config.backends, vec!["dmason"]);
        assert_eq!(config.models, vec!["ants"]);
        assert!(config.show_progress);
    }

    #[test]
    fn test_should_require_max_threads() {
        assert!(ThreadScalingCli::try_parse_from(["thread-scaling"]).is_err());
    }
}
