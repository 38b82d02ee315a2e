// src/error.rs

use std::path::PathBuf;

/// Why a single source row was dropped. Contained per row; only counted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejected {
    #[error("{field}: required value is missing")]
    Missing { field: &'static str },

    #[error("{field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("{field}: value out of range")]
    OutOfRange { field: &'static str },

    #[error("unparsable source timestamp {value:?}")]
    Timestamp { value: String },

    #[error("{field}: value not allowed")]
    NotAllowed { field: &'static str },
}

/// Feed-level and output-level failures. Fatal for the branch that hits them.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("fetching {url} failed")]
    FetchFailed {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("writing {} failed", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
