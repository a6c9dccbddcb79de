//! Build history supplied to the aggregator.
//!
//! The host owns builds and their artifacts; this module only reads them.
//! [`FsBuildHistory`] reads a job directory laid out as
//!
//! ```text
//! <job>/builds/<number>/build.json      optional: {"result": "...", "xml_report_path": "..."}
//! <job>/builds/<number>/archive/**      archived artifacts
//! ```

use std::path::{Path, PathBuf};

use loadtrend_core::{Artifact, Build, BuildNumber, BuildResult, CoreError, CoreResult};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

const BUILDS_DIR: &str = "builds";
const ARCHIVE_DIR: &str = "archive";
const BUILD_RECORD: &str = "build.json";

/// Source of a job's builds.
pub trait BuildHistory: Send + Sync {
    /// All builds of the job, newest first.
    fn builds(&self) -> CoreResult<Vec<Build>>;
}

impl BuildHistory for Vec<Build> {
    fn builds(&self) -> CoreResult<Vec<Build>> {
        let mut builds = self.clone();
        builds.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(builds)
    }
}

#[derive(Debug, Default, Deserialize)]
struct BuildRecord {
    #[serde(default)]
    result: BuildResult,
    #[serde(default)]
    xml_report_path: Option<String>,
}

/// Build history read from a job directory.
#[derive(Debug, Clone)]
pub struct FsBuildHistory {
    job_dir: PathBuf,
}

impl FsBuildHistory {
    pub fn new(job_dir: impl Into<PathBuf>) -> Self {
        Self {
            job_dir: job_dir.into(),
        }
    }

    pub fn job_dir(&self) -> &Path {
        &self.job_dir
    }

    fn read_build(&self, number: BuildNumber, dir: &Path) -> CoreResult<Build> {
        let record = read_record(&dir.join(BUILD_RECORD));
        let mut build = Build::new(number, record.result);
        build.recorded_report_path = record.xml_report_path;

        let archive = dir.join(ARCHIVE_DIR);
        if !archive.is_dir() {
            return Ok(build);
        }

        for entry in WalkDir::new(&archive).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&archive).to_path_buf();
                CoreError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&archive) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            build.artifacts.push(Artifact::new(relative, entry.path()));
        }

        Ok(build)
    }
}

fn read_record(path: &Path) -> BuildRecord {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return BuildRecord::default(),
    };
    serde_json::from_str(&contents).unwrap_or_else(|error| {
        warn!(path = %path.display(), %error, "ignoring malformed build record");
        BuildRecord::default()
    })
}

impl BuildHistory for FsBuildHistory {
    fn builds(&self) -> CoreResult<Vec<Build>> {
        let builds_dir = self.job_dir.join(BUILDS_DIR);
        let entries = match std::fs::read_dir(&builds_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %builds_dir.display(), "job has no builds");
                return Ok(Vec::new());
            }
            Err(e) => return Err(CoreError::io(builds_dir, e)),
        };

        let mut builds = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::io(&builds_dir, e))?;
            let Some(number) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            else {
                continue;
            };
            if !entry.path().is_dir() {
                continue;
            }
            builds.push(self.read_build(BuildNumber::new(number), &entry.path())?);
        }

        builds.sort_by(|a, b| b.number.cmp(&a.number));
        debug!(job = %self.job_dir.display(), builds = builds.len(), "build history loaded");
        Ok(builds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_builds_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsBuildHistory::new(dir.path()).builds().unwrap().is_empty());
    }

    #[test]
    fn test_builds_newest_first_with_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let builds = dir.path().join("builds");
        write(&builds.join("2/archive/neoload-report/report.xml"), "<report/>");
        write(&builds.join("2/archive/neoload-report/a.html"), "");
        write(
            &builds.join("2/build.json"),
            r#"{"result": "failure", "xml_report_path": "custom/report.xml"}"#,
        );
        write(&builds.join("10/archive/report.xml"), "<report/>");
        fs::create_dir_all(builds.join("lastSuccessful")).unwrap();
        write(&builds.join("11"), "not a directory");

        let history = FsBuildHistory::new(dir.path()).builds().unwrap();
        let numbers: Vec<u32> = history.iter().map(|b| b.number.get()).collect();
        assert_eq!(numbers, vec![10, 2]);

        let second = &history[1];
        assert_eq!(second.result, BuildResult::Failure);
        assert_eq!(second.recorded_report_path.as_deref(), Some("custom/report.xml"));
        let paths: Vec<&str> = second
            .artifacts
            .iter()
            .map(|a| a.relative_path.as_str())
            .collect();
        assert_eq!(paths, vec!["neoload-report/a.html", "neoload-report/report.xml"]);
        assert!(second.artifacts[1].file.ends_with("2/archive/neoload-report/report.xml"));

        assert_eq!(history[0].result, BuildResult::Unknown);
        assert_eq!(history[0].recorded_report_path, None);
    }

    #[test]
    fn test_malformed_record_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("builds/3/build.json"), "{not json");

        let history = FsBuildHistory::new(dir.path()).builds().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].result, BuildResult::Unknown);
        assert!(history[0].artifacts.is_empty());
    }

    #[test]
    fn test_in_memory_history_is_sorted() {
        let builds = vec![
            Build::new(1, BuildResult::Success),
            Build::new(3, BuildResult::Success),
            Build::new(2, BuildResult::Failure),
        ];
        let numbers: Vec<u32> = builds
            .builds()
            .unwrap()
            .iter()
            .map(|b| b.number.get())
            .collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }
}
