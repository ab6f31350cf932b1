use std::env;
use std::path::{Path, PathBuf};

use crate::types::BenchError;

/// Environment variable to override the path to the OpenABL binary.
pub const OPENABL_PATH_ENV: &str = "OPENABL_PATH";

/// Name of the OpenABL binary produced by the build.
const OPENABL_BIN: &str = "OpenABL";

/// The locations of an OpenABL checkout that the benchmarks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAblInstall {
    /// The OpenABL binary.
    pub bin: PathBuf,
    /// Directory holding the `<model>.abl` sources.
    pub example_dir: PathBuf,
    /// Directory passed to OpenABL with `-A`.
    pub asset_dir: PathBuf,
}

impl OpenAblInstall {
    /// The places that are checked for the OpenABL binary, in order.
    pub fn candidates(root: &Path) -> Vec<PathBuf> {
        vec![root.join(OPENABL_BIN), root.join("build").join(OPENABL_BIN)]
    }

    /// Find the OpenABL binary of the checkout at `root`.
    ///
    /// When `override_path` is given it is the only candidate, otherwise the first of
    /// [OpenAblInstall::candidates] that is a file wins.
    pub fn locate(root: &Path, override_path: Option<&str>) -> Result<Self, BenchError> {
        let bin = match override_path {
            Some("") => {
                return Err(BenchError::config(format!(
                    "'{OPENABL_PATH_ENV}' set to empty string"
                )));
            }
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.is_file() {
                    return Err(BenchError::ExecutableNotFound { tried: vec![path] });
                }
                path
            }
            None => {
                let tried = Self::candidates(root);
                match tried.iter().find(|candidate| candidate.is_file()) {
                    Some(found) => found.clone(),
                    None => return Err(BenchError::ExecutableNotFound { tried }),
                }
            }
        };

        log::debug!("Using OpenABL binary at {}", bin.display());

        Ok(Self {
            bin,
            example_dir: root.join("examples"),
            asset_dir: root.join("asset"),
        })
    }

    /// Like [OpenAblInstall::locate], taking the override from [`OPENABL_PATH_ENV`].
    pub fn locate_from_env(root: &Path) -> Result<Self, BenchError> {
        let override_path = env::var(OPENABL_PATH_ENV).ok();
        Self::locate(root, override_path.as_deref())
    }

    /// Path of the source file for a model.
    pub fn model_path(&self, model: &str) -> PathBuf {
        self.example_dir.join(format!("{model}.abl"))
    }
}
