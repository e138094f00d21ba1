use std::path::PathBuf;

use thiserror::Error;

/// Outcome of a call to the language model backend.
///
/// Backends classify their own failures as `QuotaExceeded` or
/// `TransientFailure`; the gateway turns an exhausted retry budget into
/// `FatalFailure`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("transient backend failure: {0}")]
    TransientFailure(String),

    #[error("backend failed after {attempts} attempts: {last}")]
    FatalFailure { attempts: u32, last: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write translation cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize translation cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set; create a .env file or export it before building")]
    MissingApiKey,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build http client: {0}")]
    Http(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("translation of {key} failed: {source}")]
    Translate {
        key: String,
        #[source]
        source: LlmError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("no markdown posts found in {0}")]
    NoPosts(PathBuf),

    #[error("slug {0:?} is used by more than one post")]
    DuplicateSlug(String),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
