use std::path::PathBuf;

use loadtrend_chart::ChartError;
use loadtrend_core::CoreError;
use loadtrend_query::QueryError;
use thiserror::Error;

/// Errors raised while refreshing a job's trends.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refresh task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
