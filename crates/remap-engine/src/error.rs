use remap_model::ModelError;
use thiserror::Error;

/// Runtime mapping errors. These propagate synchronously to the caller; no
/// retries are performed.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("source value is not an object")]
    SourceNotObject,
    #[error("target value is not an object")]
    TargetNotObject,
    #[error("data source for '{path}' failed: {message}")]
    DataSource { path: String, message: String },
    #[error("mapping plan for {source_type} -> {target_type} failed: {message}")]
    Compilation {
        source_type: String,
        target_type: String,
        message: String,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}
