use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use tracing::warn;

use crate::error::PipelineError;

static SKU_SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]+[0-9]+").unwrap());
static SKU_INFER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:DB|DS|DZ)\d+[A-Z0-9-]*").unwrap());

/// One datasheet, already converted to plain text lines by the upstream
/// extraction collaborator. The SKU comes from the filename stem (text
/// before the first `_`), with a content-based fallback for files named
/// things like `manual.txt`.
pub struct RawDocument {
    pub sku: String,
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// Load every `*.txt` datasheet under `dir`.
///
/// Per-document failures (unreadable file, unresolvable SKU) are logged and
/// skipped; only an unreadable directory fails the batch.
pub fn load_documents(dir: &Path) -> anyhow::Result<Vec<RawDocument>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("unreadable datasheet directory {}", dir.display()))?;

    let mut docs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        match load_document(&path) {
            Ok(doc) => docs.push(doc),
            Err(err) => warn!(%err, "skipping document"),
        }
    }
    docs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(docs)
}

pub fn load_document(path: &Path) -> Result<RawDocument, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PipelineError::DocumentNotFound(path.to_path_buf())
        } else {
            PipelineError::DocumentRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let lines: Vec<String> = text.lines().map(String::from).collect();
    let sku = resolve_sku(path, &text)?;
    Ok(RawDocument {
        sku,
        path: path.to_path_buf(),
        lines,
    })
}

/// SKU from the filename stem; if the stem is not SKU-shaped, try to infer
/// one from the document text. Documents with no resolvable SKU are skipped
/// entirely rather than half-processed.
fn resolve_sku(path: &Path, text: &str) -> Result<String, PipelineError> {
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let stem = file.trim_end_matches(".txt");
    let candidate = stem.split('_').next().unwrap_or_default();

    if is_valid_sku(candidate) {
        return Ok(candidate.to_string());
    }
    if let Some(m) = SKU_INFER_RE.find(text) {
        return Ok(m.as_str().to_string());
    }
    Err(PipelineError::InvalidSku {
        sku: candidate.to_string(),
        file,
    })
}

pub fn is_valid_sku(sku: &str) -> bool {
    sku.len() >= 3 && SKU_SHAPE_RE.is_match(sku)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_from_filename_stem() {
        let path = Path::new("data/DB3832-0035EC-D_datasheet.txt");
        assert_eq!(resolve_sku(path, "").unwrap(), "DB3832-0035EC-D");
    }

    #[test]
    fn manual_filename_infers_sku_from_content() {
        let path = Path::new("data/manual.txt");
        let sku = resolve_sku(path, "Applies to DZ4505-0025 slides only").unwrap();
        assert_eq!(sku, "DZ4505-0025");
    }

    #[test]
    fn unresolvable_sku_is_an_error() {
        let path = Path::new("data/manual.txt");
        let err = resolve_sku(path, "no product identifiers here").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSku { .. }));
    }

    #[test]
    fn sku_shape_validation() {
        assert!(is_valid_sku("DZ4505"));
        assert!(is_valid_sku("db3832"));
        assert!(!is_valid_sku("manual"));
        assert!(!is_valid_sku("D1"));
        assert!(!is_valid_sku("12345"));
    }
}
