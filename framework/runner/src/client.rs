use std::collections::BTreeMap;
use std::ffi::OsString;
use std::process::Command;

use itertools::Itertools;

use crate::openabl_binary::OpenAblInstall;
use crate::types::InvocationError;

/// Marker that OpenABL prints in front of the measured execution time.
const EXECUTION_TIME_MARKER: &str = "Execution time: ";

/// Parameters for one invocation of a model.
///
/// The agent and timestep counts are common to every backend. Anything else goes into one of the
/// extension maps: `params` are passed as `-P key=value` model parameters and `config` as
/// `-C key=value` backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub num_agents: u64,
    pub num_timesteps: u64,
    pub params: BTreeMap<String, String>,
    pub config: BTreeMap<String, String>,
}

impl RunConfig {
    pub fn new(num_agents: u64, num_timesteps: u64) -> Self {
        Self {
            num_agents,
            num_timesteps,
            params: BTreeMap::new(),
            config: BTreeMap::new(),
        }
    }

    /// Builds a [`RunConfig`] with an extra model parameter.
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Builds a [`RunConfig`] with an extra backend configuration value.
    pub fn config(mut self, key: &str, value: impl ToString) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    /// All `-P` parameters, common ones first.
    pub fn all_params(&self) -> Vec<(String, String)> {
        [
            ("num_timesteps".to_string(), self.num_timesteps.to_string()),
            ("num_agents".to_string(), self.num_agents.to_string()),
        ]
        .into_iter()
        .chain(self.params.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect()
    }
}

/// Runs a model once and reports how long it took.
///
/// The production implementation is [OpenAblRunner]. Tests substitute an implementation that
/// returns scripted timings without starting any process.
pub trait RunnerClient {
    /// Run `model` on `backend` and return the execution time in seconds.
    fn invoke(
        &mut self,
        model: &str,
        backend: &str,
        config: &RunConfig,
    ) -> Result<f64, InvocationError>;
}

/// Runs models through the OpenABL binary.
///
/// Each invocation is one child process that is waited on before returning, with no timeout.
#[derive(Debug, Clone)]
pub struct OpenAblRunner {
    install: OpenAblInstall,
}

impl OpenAblRunner {
    pub fn new(install: OpenAblInstall) -> Self {
        Self { install }
    }

    pub fn install(&self) -> &OpenAblInstall {
        &self.install
    }

    /// The arguments passed to the OpenABL binary.
    pub fn args(&self, model: &str, backend: &str, config: &RunConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            self.install.model_path(model).into(),
            "-b".into(),
            backend.into(),
            "-A".into(),
            self.install.asset_dir.clone().into(),
            "-R".into(),
        ];

        for (key, value) in config.all_params() {
            args.push("-P".into());
            args.push(format!("{key}={value}").into());
        }

        for (key, value) in &config.config {
            args.push("-C".into());
            args.push(format!("{key}={value}").into());
        }

        args
    }
}

impl RunnerClient for OpenAblRunner {
    fn invoke(
        &mut self,
        model: &str,
        backend: &str,
        config: &RunConfig,
    ) -> Result<f64, InvocationError> {
        let args = self.args(model, backend, config);
        let command = std::iter::once(self.install.bin.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|arg| arg.to_string_lossy())
            .join(" ");
        log::debug!("Running: {command}");

        let output = Command::new(&self.install.bin)
            .args(&args)
            .output()
            .map_err(|source| InvocationError::Spawn {
                command: command.clone(),
                source,
            })?;

        let mut transcript = String::from_utf8_lossy(&output.stdout).into_owned();
        transcript.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(InvocationError::InvocationFailed {
                command,
                status: output.status,
                output: transcript,
            });
        }

        match parse_execution_time(&transcript) {
            Some(elapsed) => Ok(elapsed),
            None => Err(InvocationError::MetricParseFailed {
                command,
                output: transcript,
            }),
        }
    }
}

/// Find the first `Execution time: <float>s` line in the output of OpenABL.
///
/// Negative or non-finite times are not accepted as a measurement.
pub fn parse_execution_time(output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once(EXECUTION_TIME_MARKER)?;
        let value = rest.trim_end().strip_suffix('s')?;
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|elapsed| elapsed.is_finite() && *elapsed >= 0.0)
    })
}
