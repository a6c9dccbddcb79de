//! Refresh orchestration: lock, aggregate, render, publish.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use loadtrend_chart::{ChartRenderer, RenderedChart};
use loadtrend_core::{JobTrendConfig, LoadtrendConfig, RefreshLock, TrendSet};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::aggregator::TrendAggregator;
use crate::error::{ServiceError, ServiceResult};
use crate::history::BuildHistory;
use crate::metrics::{CHARTS_WRITTEN_TOTAL, REFRESH_DURATION_SECONDS, REFRESH_TOTAL};

/// Result of one refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Every image was rendered and published.
    Completed { charts: Vec<RenderedChart> },
    /// Another refresh of the same job holds the lock; nothing was done.
    AlreadyRunning,
    /// A resource failure stopped the refresh; previous images are untouched.
    Abandoned { reason: String },
}

impl RefreshOutcome {
    /// Metric label for this outcome.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::AlreadyRunning => "already_running",
            Self::Abandoned { .. } => "abandoned",
        }
    }
}

/// Refreshes trend images, at most once at a time per job key.
#[derive(Debug, Clone)]
pub struct TrendRefresher {
    lock: Arc<RefreshLock>,
    aggregator: TrendAggregator,
    renderer: ChartRenderer,
}

impl TrendRefresher {
    pub fn new(config: &LoadtrendConfig) -> Self {
        Self::with_lock(config, Arc::new(RefreshLock::default()))
    }

    /// Shares `lock` with other refreshers, e.g. one per output location.
    pub fn with_lock(config: &LoadtrendConfig, lock: Arc<RefreshLock>) -> Self {
        Self {
            lock,
            aggregator: TrendAggregator::new(config.report.clone()),
            renderer: ChartRenderer::new(config.render.clone()),
        }
    }

    pub fn lock(&self) -> &Arc<RefreshLock> {
        &self.lock
    }

    /// Rebuilds and re-renders the trends of job `key` into `output_dir`.
    ///
    /// Never fails: contention and resource failures are reported as
    /// outcomes, and the job's lock is released whatever happens.
    #[instrument(skip_all, fields(key = %key, output = %output_dir.display()))]
    pub fn refresh(
        &self,
        key: &str,
        job: &JobTrendConfig,
        history: &dyn BuildHistory,
        output_dir: &Path,
    ) -> RefreshOutcome {
        let Some(_guard) = self.lock.try_guard(key) else {
            info!("refresh already running for this job");
            REFRESH_TOTAL.with_label_values(&["already_running"]).inc();
            return RefreshOutcome::AlreadyRunning;
        };

        let started = Instant::now();
        let outcome = match self.run(job, history, output_dir) {
            Ok(charts) => {
                info!(charts = charts.len(), "trend images refreshed");
                RefreshOutcome::Completed { charts }
            }
            Err(error) => {
                warn!(%error, "trend refresh abandoned");
                RefreshOutcome::Abandoned {
                    reason: error.to_string(),
                }
            }
        };

        let label = outcome.label();
        REFRESH_TOTAL.with_label_values(&[label]).inc();
        REFRESH_DURATION_SECONDS
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());
        outcome
    }

    /// Runs [`refresh`](Self::refresh) on Tokio's blocking pool.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        key: impl Into<String>,
        job: JobTrendConfig,
        history: Arc<dyn BuildHistory>,
        output_dir: PathBuf,
    ) -> JoinHandle<RefreshOutcome> {
        let refresher = Arc::clone(self);
        let key = key.into();
        tokio::task::spawn_blocking(move || {
            refresher.refresh(&key, &job, history.as_ref(), &output_dir)
        })
    }

    fn run(
        &self,
        job: &JobTrendConfig,
        history: &dyn BuildHistory,
        output_dir: &Path,
    ) -> ServiceResult<Vec<RenderedChart>> {
        let builds = history.builds()?;
        let trend_set = self.aggregator.rebuild(job, &builds);

        let staging = sibling_dir(output_dir, "staging");
        remove_dir_if_present(&staging)?;

        let result = self
            .renderer
            .render(&trend_set, &staging)
            .map_err(ServiceError::from)
            .and_then(|charts| self.publish(&trend_set, charts, output_dir));

        if let Err(error) = remove_dir_if_present(&staging) {
            warn!(%error, "failed to clean up staging directory");
        }
        result
    }

    /// Swaps the staged images into `output_dir`.
    ///
    /// Previous `<prefix>NN.png` images are moved aside first. If a staged
    /// image cannot be moved in, the images already moved in are removed
    /// and the previous set is put back. Other files in `output_dir` are
    /// never touched.
    fn publish(
        &self,
        trend_set: &TrendSet,
        charts: Vec<RenderedChart>,
        output_dir: &Path,
    ) -> ServiceResult<Vec<RenderedChart>> {
        fs::create_dir_all(output_dir).map_err(|e| ServiceError::io(output_dir, e))?;

        let backup = sibling_dir(output_dir, "previous");
        remove_dir_if_present(&backup)?;
        fs::create_dir_all(&backup).map_err(|e| ServiceError::io(&backup, e))?;

        let mut previous = Vec::new();
        let mut published = Vec::with_capacity(charts.len());
        let swapped = self
            .move_aside(output_dir, &backup, &mut previous)
            .and_then(|()| self.move_in(charts, output_dir, &mut published));

        if let Err(error) = swapped {
            if restore(&published, &previous, &backup, output_dir) {
                discard_backup(&backup);
            } else {
                warn!(backup = %backup.display(), "previous trend images left in backup directory");
            }
            return Err(error);
        }

        debug!(replaced = previous.len(), written = published.len(), "trend images swapped");
        discard_backup(&backup);

        for graph in trend_set.graphs() {
            let kind = if graph.spec.has_legend() { "custom" } else { "builtin" };
            CHARTS_WRITTEN_TOTAL.with_label_values(&[kind]).inc();
        }

        Ok(published)
    }

    fn move_aside(
        &self,
        output_dir: &Path,
        backup: &Path,
        moved: &mut Vec<OsString>,
    ) -> ServiceResult<()> {
        let prefix = &self.renderer.config().file_prefix;
        let entries = fs::read_dir(output_dir).map_err(|e| ServiceError::io(output_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ServiceError::io(output_dir, e))?;
            let name = entry.file_name();
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_file || name.to_str().and_then(|n| image_index(n, prefix)).is_none() {
                continue;
            }
            fs::rename(entry.path(), backup.join(&name))
                .map_err(|e| ServiceError::io(entry.path(), e))?;
            moved.push(name);
        }
        Ok(())
    }

    fn move_in(
        &self,
        charts: Vec<RenderedChart>,
        output_dir: &Path,
        published: &mut Vec<RenderedChart>,
    ) -> ServiceResult<()> {
        for (index, mut chart) in charts.into_iter().enumerate() {
            let target = output_dir.join(self.renderer.file_name(index));
            fs::rename(&chart.path, &target).map_err(|e| ServiceError::io(&target, e))?;
            chart.path = target;
            published.push(chart);
        }
        Ok(())
    }
}

/// Undoes a partial swap. Returns whether every previous image is back.
fn restore(
    published: &[RenderedChart],
    previous: &[OsString],
    backup: &Path,
    output_dir: &Path,
) -> bool {
    for chart in published {
        if let Err(error) = fs::remove_file(&chart.path) {
            warn!(path = %chart.path.display(), %error, "failed to remove partially published image");
        }
    }

    let mut restored = true;
    for name in previous {
        if let Err(error) = fs::rename(backup.join(name), output_dir.join(name)) {
            warn!(file = ?name, %error, "failed to restore previous trend image");
            restored = false;
        }
    }
    restored
}

fn discard_backup(backup: &Path) {
    if let Err(error) = remove_dir_if_present(backup) {
        warn!(%error, "failed to discard previous trend images");
    }
}

/// Hidden sibling of `output_dir`, e.g. `.trends.staging`.
fn sibling_dir(output_dir: &Path, suffix: &str) -> PathBuf {
    let name = output_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trends".to_string());
    let parent = output_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parent.join(format!(".{name}.{suffix}"))
}

fn remove_dir_if_present(dir: &Path) -> ServiceResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ServiceError::io(dir, e)),
    }
}

/// Index of a `<prefix>NN.png` image name.
fn image_index(name: &str, prefix: &str) -> Option<usize> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(".png")?;
    if digits.len() < 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_index() {
        assert_eq!(image_index("stat00.png", "stat"), Some(0));
        assert_eq!(image_index("stat12.png", "stat"), Some(12));
        assert_eq!(image_index("stat123.png", "stat"), Some(123));
        assert_eq!(image_index("stat1.png", "stat"), None);
        assert_eq!(image_index("stat0a.png", "stat"), None);
        assert_eq!(image_index("other00.png", "stat"), None);
        assert_eq!(image_index("stat00.png.tmp", "stat"), None);
    }

    #[test]
    fn test_sibling_dirs() {
        assert_eq!(
            sibling_dir(Path::new("/jobs/a/trends"), "staging"),
            PathBuf::from("/jobs/a/.trends.staging")
        );
        assert_eq!(
            sibling_dir(Path::new("out"), "previous"),
            PathBuf::from("./.out.previous")
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(RefreshOutcome::AlreadyRunning.label(), "already_running");
        assert_eq!(
            RefreshOutcome::Abandoned {
                reason: String::new()
            }
            .label(),
            "abandoned"
        );
        assert_eq!(
            RefreshOutcome::Completed { charts: vec![] }.label(),
            "completed"
        );
    }
}
