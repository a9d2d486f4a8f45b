use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("corpus not found: {0}")]
    CorpusNotFound(PathBuf),
    #[error("I/O error reading corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
