use crate::db::DocumentRecord;
use crate::{PortalError, pdf, router::PortalState};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const PDF_MIME: &str = "application/pdf";
const UPLOAD_FIELD: &str = "file";
const FALLBACK_DOWNLOAD_STEM: &str = "document";

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    /// Filename offered to the browser.
    pub download: Option<String>,
    /// `true` asks for inline display instead of an attachment.
    pub inline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub document: DocumentRecord,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /documents -> all records, newest first.
pub async fn list_documents(
    State(state): State<PortalState>,
) -> Result<Json<Vec<DocumentRecord>>, PortalError> {
    Ok(Json(state.storage.list().await?))
}

/// POST /documents/upload -> stores the multipart `file` field.
///
/// The file is written before the row is inserted; if the insert fails the
/// file is removed again.
pub async fn upload_document(
    State(state): State<PortalState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), PortalError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let Some(original) = field
            .file_name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
        else {
            return Err(PortalError::BadUpload(
                "Please upload a valid PDF file.".to_string(),
            ));
        };

        if state.strict_pdf_uploads && field.content_type() != Some(PDF_MIME) {
            return Err(PortalError::BadUpload(
                "Only PDF files are allowed!".to_string(),
            ));
        }

        let stored = state
            .files
            .create(&original, state.max_upload_bytes, field)
            .await?;
        let filepath = stored.path.to_string_lossy().into_owned();

        let size = i64::try_from(stored.size).unwrap_or(i64::MAX);
        let document = match state.storage.insert(&original, &filepath, size).await {
            Ok(doc) => doc,
            Err(err) => {
                if let Err(e) = state.files.remove(&filepath).await {
                    warn!(filepath = %filepath, error = %e, "failed to remove orphaned upload");
                }
                return Err(err);
            }
        };

        info!(
            id = document.id,
            filename = %document.filename,
            size = document.size,
            "document uploaded"
        );
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "File uploaded successfully",
                document,
            }),
        ));
    }

    Err(PortalError::BadUpload(
        "Please upload a valid PDF file.".to_string(),
    ))
}

/// GET /documents/{id} -> the stored file, normalized to a PDF.
pub async fn get_document(
    State(state): State<PortalState>,
    Path(id): Path<i64>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, PortalError> {
    let document = state
        .storage
        .get_by_id(id)
        .await?
        .ok_or(PortalError::DocumentNotFound(id))?;

    let raw = state.files.read(&document.filepath).await?;
    let normalized = tokio::task::spawn_blocking(move || pdf::normalize(&raw)).await?;
    info!(id, tier = %normalized.tier, bytes = normalized.bytes.len(), "serving document");

    let name = download_name(query.download.as_deref(), &document.filename);
    let inline = query.inline.as_deref() == Some("true");

    Ok((
        [
            (header::CONTENT_TYPE, PDF_MIME.to_string()),
            (header::CONTENT_LENGTH, normalized.bytes.len().to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&name, inline)),
        ],
        normalized.bytes,
    )
        .into_response())
}

/// DELETE /documents/{id} -> removes the row, then the file (best-effort).
pub async fn delete_document(
    State(state): State<PortalState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, PortalError> {
    let document = state
        .storage
        .get_by_id(id)
        .await?
        .ok_or(PortalError::DocumentNotFound(id))?;

    if !state.storage.delete_by_id(id).await? {
        return Err(PortalError::DocumentNotFound(id));
    }

    if let Err(e) = state.files.remove(&document.filepath).await {
        warn!(id, filepath = %document.filepath, error = %e, "failed to delete local file");
    }

    info!(id, "document deleted");
    Ok(Json(MessageResponse {
        message: "File deleted successfully",
    }))
}

/// Basename of the requested name (or the stored one), ending in `.pdf`.
pub fn download_name(requested: Option<&str>, stored: &str) -> String {
    let source = requested.filter(|r| !r.trim().is_empty()).unwrap_or(stored);
    let base: String = source
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| (' '..='~').contains(c) && *c != '"')
        .collect();
    let base = base.trim();

    let base = if base.is_empty() || base.eq_ignore_ascii_case(".pdf") {
        FALLBACK_DOWNLOAD_STEM
    } else {
        base
    };

    if base.to_ascii_lowercase().ends_with(".pdf") {
        base.to_string()
    } else {
        format!("{base}.pdf")
    }
}

pub fn content_disposition(name: &str, inline: bool) -> String {
    let kind = if inline { "inline" } else { "attachment" };
    format!("{kind}; filename=\"{name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_name_prefers_requested_basename() {
        assert_eq!(
            download_name(Some("../secret/lab results"), "stored.pdf"),
            "lab results.pdf"
        );
    }

    #[test]
    fn download_name_falls_back_to_stored_filename() {
        assert_eq!(download_name(None, "Scan.PDF"), "Scan.PDF");
        assert_eq!(download_name(Some("  "), "notes.txt"), "notes.txt.pdf");
    }

    #[test]
    fn download_name_ignores_trailing_separators() {
        assert_eq!(download_name(Some("foo/"), "x.pdf"), "foo.pdf");
        assert_eq!(download_name(Some(r"dir\report.pdf\\"), "x.pdf"), "report.pdf");
        assert_eq!(download_name(Some("///"), "x"), "document.pdf");
    }

    #[test]
    fn download_name_strips_quotes_and_non_ascii() {
        assert_eq!(download_name(Some("my \"fav\" r\u{e9}sum\u{e9}"), "x"), "my fav rsum.pdf");
        assert_eq!(download_name(Some("\u{65e5}\u{672c}"), "x"), "document.pdf");
    }

    #[test]
    fn disposition_kind_follows_inline_flag() {
        assert_eq!(
            content_disposition("a.pdf", true),
            "inline; filename=\"a.pdf\""
        );
        assert_eq!(
            content_disposition("a.pdf", false),
            "attachment; filename=\"a.pdf\""
        );
    }
}
