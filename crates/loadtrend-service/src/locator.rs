//! Locating a build's XML report among its artifacts.

use loadtrend_core::{Artifact, Build};

const WORKSPACE_MARKERS: [&str; 2] = ["%WORKSPACE%/", "${WORKSPACE}/"];

/// Removes workspace variable prefixes such as `%WORKSPACE%/` from a
/// configured path; artifacts are always relative to the workspace.
#[must_use]
pub fn strip_workspace(path: &str) -> String {
    WORKSPACE_MARKERS
        .iter()
        .fold(path.to_string(), |path, marker| path.replace(marker, ""))
}

/// Candidate report paths for `build`, in priority order: the path recorded
/// when the load test ran, the job's configured path, then `default_path`.
///
/// Blank candidates are dropped and separators normalised to `/`.
#[must_use]
pub fn candidate_paths(build: &Build, configured: Option<&str>, default_path: &str) -> Vec<String> {
    let recorded = build.recorded_report_path.as_deref().map(str::to_string);
    let configured = configured.map(strip_workspace);

    recorded
        .into_iter()
        .chain(configured)
        .chain(std::iter::once(default_path.to_string()))
        .map(|path| path.trim().replace('\\', "/"))
        .filter(|path| !path.is_empty())
        .collect()
}

/// Returns the first artifact whose relative path ends with a candidate.
///
/// Candidates are tried in order and, for each, artifacts in listing order.
#[must_use]
pub fn locate<'b, S: AsRef<str>>(build: &'b Build, candidates: &[S]) -> Option<&'b Artifact> {
    candidates.iter().find_map(|candidate| {
        build
            .artifacts
            .iter()
            .find(|artifact| artifact.relative_path.ends_with(candidate.as_ref()))
    })
}
