use std::path::PathBuf;

/// Errors raised while loading reports or compiling queries.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid query `{query}` at offset {offset}: {message}")]
    Syntax {
        query: String,
        offset: usize,
        message: String,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type QueryResult<T> = Result<T, QueryError>;
