//! iFDO document import: decode, structurally validate, map and persist.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use ifdo_core::error::CoreError;
use ifdo_core::ifdo::validation::format_issues;
use ifdo_core::ifdo::{parse_document, validate_document};
use ifdo_db::models::dataset::DatasetDetail;
use ifdo_db::repositories::IfdoImportRepo;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded document.
pub const UPLOAD_FIELD: &str = "input_file";

/// Request bodies for imports may be large; the default 2 MiB is not enough.
pub const IMPORT_BODY_LIMIT: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format named by the `{format}` path segment of a raw-body import.
    pub fn from_segment(segment: &str) -> AppResult<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(unsupported()),
        }
    }

    /// Format of an uploaded file, by content type first and extension second.
    pub fn from_upload(content_type: Option<&str>, file_name: Option<&str>) -> AppResult<Self> {
        let by_type = content_type.and_then(|ct| {
            let essence = ct.split(';').next().unwrap_or_default().trim();
            match essence {
                "application/json" => Some(Self::Json),
                "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
                    Some(Self::Yaml)
                }
                _ => None,
            }
        });
        if let Some(format) = by_type {
            return Ok(format);
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(unsupported()),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> AppResult<Value> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|err| {
                AppError::Core(CoreError::Validation(format!("Invalid JSON document: {err}")))
            }),
            Self::Yaml => {
                let text = std::str::from_utf8(bytes).map_err(|err| {
                    AppError::Core(CoreError::Validation(format!(
                        "YAML document is not valid UTF-8: {err}"
                    )))
                })?;
                serde_yaml_ng::from_str(text).map_err(|err| {
                    AppError::Core(CoreError::Validation(format!("Invalid YAML document: {err}")))
                })
            }
        }
    }
}

fn unsupported() -> AppError {
    AppError::Core(CoreError::Validation("unsupported file format".to_string()))
}

/// POST /v1/datasets/ifdo/{format}
///
/// `format` is `json` or `yaml`; the request body is the document.
pub async fn import_body(
    State(state): State<AppState>,
    Path(format): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<DatasetDetail>)> {
    let document = DocumentFormat::from_segment(&format)?.decode(&body)?;
    let detail = import_document(&state, document).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// POST /v1/datasets/ifdo/file
///
/// Multipart upload with the document in the `input_file` field.
pub async fn import_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DatasetDetail>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let format = DocumentFormat::from_upload(field.content_type(), field.file_name())?;
        let data = field.bytes().await?;
        let document = format.decode(&data)?;
        let detail = import_document(&state, document).await?;
        return Ok((StatusCode::CREATED, Json(detail)));
    }

    Err(AppError::BadRequest(format!(
        "Multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// Validate, map and persist one decoded document.
///
/// Structural issues are logged and tolerated unless strict validation is
/// configured.
async fn import_document(state: &AppState, document: Value) -> AppResult<DatasetDetail> {
    let issues = validate_document(&document);
    if !issues.is_empty() {
        let report = format_issues(&issues);
        if state.config.strict_validation {
            return Err(CoreError::Validation(report).into());
        }
        tracing::warn!(issues = issues.len(), %report, "Importing iFDO document with structural issues");
    }

    let parsed = parse_document(&document)?;
    let detail = IfdoImportRepo::import(&state.pool, &parsed).await?;
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn segment_formats() {
        assert_eq!(DocumentFormat::from_segment("json").unwrap(), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_segment("YAML").unwrap(), DocumentFormat::Yaml);
        assert_matches!(
            DocumentFormat::from_segment("xml"),
            Err(AppError::Core(CoreError::Validation(msg))) if msg == "unsupported file format"
        );
    }

    #[test]
    fn upload_content_type_wins_over_extension() {
        assert_eq!(
            DocumentFormat::from_upload(Some("application/json; charset=utf-8"), Some("doc.yaml"))
                .unwrap(),
            DocumentFormat::Json
        );
    }

    #[test]
    fn upload_falls_back_to_extension() {
        assert_eq!(
            DocumentFormat::from_upload(Some("application/octet-stream"), Some("ifdo.YML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_matches!(
            DocumentFormat::from_upload(None, Some("ifdo.txt")),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(DocumentFormat::from_upload(None, None), Err(AppError::Core(_)));
    }

    #[test]
    fn yaml_decodes_to_json_values() {
        let doc = DocumentFormat::Yaml
            .decode(b"image-set-header:\n  image-set-name: Dive\n  image-altitude-meters: 4.5\n")
            .unwrap();
        assert_eq!(doc["image-set-header"]["image-set-name"], "Dive");
        assert_eq!(doc["image-set-header"]["image-altitude-meters"], 4.5);
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        assert_matches!(
            DocumentFormat::Json.decode(b"{not json"),
            Err(AppError::Core(CoreError::Validation(msg))) if msg.starts_with("Invalid JSON")
        );
    }
}
