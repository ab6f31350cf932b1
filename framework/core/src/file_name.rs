use std::fmt;

const GROUPED_PREFIX: &str = "bench_";
const SCALING_PREFIX: &str = "scale_";
const RESULT_EXTENSION: &str = ".txt";

/// Which kind of sweep produced a result file, and therefore how it is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Agent-count sweep, one file per `(model, backend)`.
    SizeSweep,
    /// Thread-count sweep of a single distributed backend, one file per model.
    ThreadScaling,
}

/// The grouping keys encoded in a result file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultFileName {
    /// `bench_<model>_<backend>.txt`
    Grouped { model: String, backend: String },
    /// `scale_<model>.txt`
    ScalingOnly { model: String },
    /// Any other file name, kept as-is.
    Unrecognized(String),
}

impl ResultFileName {
    pub fn new(kind: ResultKind, model: &str, backend: &str) -> Self {
        match kind {
            ResultKind::SizeSweep => ResultFileName::Grouped {
                model: model.to_string(),
                backend: backend.to_string(),
            },
            ResultKind::ThreadScaling => ResultFileName::ScalingOnly {
                model: model.to_string(),
            },
        }
    }

    /// Classify a bare file name (no directory components).
    ///
    /// The backend of a grouped name is whatever follows the last `_`, so model names may contain
    /// underscores but backend names may not.
    pub fn parse(file_name: &str) -> Self {
        if let Some(stem) = file_name
            .strip_prefix(GROUPED_PREFIX)
            .and_then(|rest| rest.strip_suffix(RESULT_EXTENSION))
        {
            if let Some((model, backend)) = stem.rsplit_once('_') {
                if !model.is_empty() && !backend.is_empty() {
                    return ResultFileName::Grouped {
                        model: model.to_string(),
                        backend: backend.to_string(),
                    };
                }
            }
        }

        if let Some(model) = file_name
            .strip_prefix(SCALING_PREFIX)
            .and_then(|rest| rest.strip_suffix(RESULT_EXTENSION))
        {
            if !model.is_empty() {
                return ResultFileName::ScalingOnly {
                    model: model.to_string(),
                };
            }
        }

        ResultFileName::Unrecognized(file_name.to_string())
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            ResultFileName::Grouped { model, .. } | ResultFileName::ScalingOnly { model } => {
                Some(model)
            }
            ResultFileName::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for ResultFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultFileName::Grouped { model, backend } => {
                write!(f, "{GROUPED_PREFIX}{model}_{backend}{RESULT_EXTENSION}")
            }
            ResultFileName::ScalingOnly { model } => {
                write!(f, "{SCALING_PREFIX}{model}{RESULT_EXTENSION}")
            }
            ResultFileName::Unrecognized(name) => write!(f, "{name}"),
        }
    }
}
