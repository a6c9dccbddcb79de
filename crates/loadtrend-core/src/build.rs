use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Monotonically increasing build identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildNumber(u32);

impl BuildNumber {
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for BuildNumber {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome recorded by the host for a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildResult {
    Success,
    Failure,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One archived file of a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the build's artifact root, always `/`-separated.
    pub relative_path: String,
    /// Location of the file on disk.
    pub file: PathBuf,
}

impl Artifact {
    /// Creates an artifact, normalising `\` separators in the relative path.
    #[must_use]
    pub fn new(relative_path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into().replace('\\', "/"),
            file: file.into(),
        }
    }
}

/// A build record as supplied by the build-history collaborator.
///
/// The core only reads builds; it never mutates or persists them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Build {
    pub number: BuildNumber,
    pub result: BuildResult,
    /// Archived files, in the order the host lists them.
    pub artifacts: Vec<Artifact>,
    /// Report path recorded when the load test ran, if any.
    pub recorded_report_path: Option<String>,
}

impl Build {
    #[must_use]
    pub fn new(number: impl Into<BuildNumber>, result: BuildResult) -> Self {
        Self {
            number: number.into(),
            result,
            artifacts: Vec::new(),
            recorded_report_path: None,
        }
    }

    #[must_use]
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    #[must_use]
    pub fn with_recorded_report_path(mut self, path: impl Into<String>) -> Self {
        self.recorded_report_path = Some(path.into());
        self
    }
}
