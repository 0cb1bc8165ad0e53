use std::path::PathBuf;

use thiserror::Error;

/// Per-item failures. Everything here isolates to one document or product;
/// only `CatalogRead` / an unreadable sheet directory aborts the batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("failed to read document {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid SKU {sku:?} from {file}")]
    InvalidSku { sku: String, file: String },

    #[error("catalog source unreadable: {path}: {reason}")]
    CatalogRead { path: PathBuf, reason: String },
}
