use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while rendering or writing chart images.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to encode chart image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chart {width}x{height} is too small to draw")]
    TooSmall { width: u32, height: u32 },
}

impl ChartError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
