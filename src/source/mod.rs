//! Tabular sources and their relation expressions.
//!
//! A source is either a CSV file on disk or an uploaded byte blob. Both
//! resolve to a DuckDB relation expression (`read_csv_auto('<path>')`) that
//! the synthesizer splices into `FROM` clauses. Uploads are first written to
//! disk through an [`UploadStore`].

mod store;

pub use store::{UploadKey, UploadStore};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, PivotResult};
use crate::executor::QueryExecutor;
use crate::sql::quote_literal;

/// Name used for uploads that arrive without one.
pub const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

/// Loose source description as received from a caller.
///
/// Converted into a [`TabularSource`] with `TryFrom`, which rejects unknown
/// kinds and missing payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// `"path"` or `"upload"`.
    pub kind: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing)]
    pub bytes: Option<Vec<u8>>,
}

/// A resolvable source of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabularSource {
    /// CSV file on disk.
    Path(PathBuf),
    /// Uploaded CSV content.
    Upload { name: String, bytes: Vec<u8> },
}

impl TabularSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        TabularSource::Path(path.into())
    }

    pub fn upload(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        TabularSource::Upload {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Display name: the file name for paths, the original name for uploads.
    pub fn display_name(&self) -> String {
        match self {
            TabularSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            TabularSource::Upload { name, .. } => name.clone(),
        }
    }
}

impl TryFrom<SourceDescriptor> for TabularSource {
    type Error = PivotError;

    fn try_from(desc: SourceDescriptor) -> Result<Self, Self::Error> {
        match desc.kind.as_str() {
            "path" => match desc.path {
                Some(path) if !path.as_os_str().is_empty() => Ok(TabularSource::Path(path)),
                _ => Err(PivotError::UnresolvedSource(
                    "path source without a path".to_string(),
                )),
            },
            "upload" => {
                let name = desc.name.unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
                match desc.bytes {
                    Some(bytes) => Ok(TabularSource::Upload { name, bytes }),
                    None => Err(PivotError::MissingUpload { name }),
                }
            }
            other => Err(PivotError::UnresolvedSource(format!(
                "unknown source kind: {other:?}"
            ))),
        }
    }
}

/// One column as reported by `DESCRIBE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Engine type string, e.g. `BIGINT` or `DECIMAL(18,2)`.
    pub raw_type: String,
}

/// Relation expression for a CSV file.
///
/// Windows separators are normalized to `/`, which DuckDB accepts everywhere.
pub fn relation_for_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    format!("read_csv_auto({})", quote_literal(normalized))
}

/// Resolve `source` to a relation expression, materializing uploads in `uploads`.
///
/// Idempotent for the same content within the lifetime of `uploads`.
pub fn resolve_relation(source: &TabularSource, uploads: &UploadStore) -> PivotResult<String> {
    match source {
        TabularSource::Path(path) => Ok(relation_for_path(path)),
        TabularSource::Upload { name, bytes } => {
            let path = uploads.ensure_materialized(name, bytes)?;
            Ok(relation_for_path(&path))
        }
    }
}

/// List the columns and engine types of `relation`.
pub async fn describe_columns<E>(executor: &E, relation: &str) -> PivotResult<Vec<ColumnDescriptor>>
where
    E: QueryExecutor + ?Sized,
{
    let table = executor
        .execute(&format!("DESCRIBE SELECT * FROM {relation}"))
        .await?;

    let (name_idx, type_idx) = match (
        table.column_index("column_name"),
        table.column_index("column_type"),
    ) {
        (Some(n), Some(t)) => (n, t),
        _ => {
            return Err(PivotError::UnexpectedResult(
                "DESCRIBE did not return column_name/column_type".to_string(),
            ))
        }
    };

    table
        .rows
        .iter()
        .map(|row| {
            let text = |idx: usize| row.get(idx).and_then(|v| v.as_str()).map(str::to_string);
            match (text(name_idx), text(type_idx)) {
                (Some(name), Some(raw_type)) => Ok(ColumnDescriptor { name, raw_type }),
                _ => Err(PivotError::UnexpectedResult(format!(
                    "malformed DESCRIBE row: {row:?}"
                ))),
            }
        })
        .collect()
}
