//! Error types for loading, writing and configuring a run

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read the input matrix. Always fatal for a run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a readable npz archive: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{path} has no `{member}` member")]
    MissingMember { path: PathBuf, member: String },

    #[error("member `{member}` of {path} is not a usable array: {reason}")]
    Array {
        path: PathBuf,
        member: String,
        reason: String,
    },

    #[error("{path} stores an unsupported sparse format `{format}`")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("{path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Failure to write a result file. Always fatal for a run.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot build npz archive {path}: {reason}")]
    Npz { path: PathBuf, reason: String },
}

/// Rejected configuration value.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be at least 1")]
    Zero { name: &'static str },
}

/// Any error a pipeline run can end with.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
