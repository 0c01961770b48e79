use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("failed to read {}: {source}", path.display())]
    IoRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("malformed query: {0}")]
    MalformedQuery(String),
}

impl SearchError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        SearchError::CorruptIndex(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        SearchError::MalformedQuery(msg.into())
    }
}
