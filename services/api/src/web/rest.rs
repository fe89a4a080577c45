//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::adapters::extract::resolve_mime;
use crate::adapters::object_store::object_key;
use crate::error::ApiError;
use crate::report::{render_report, report_filename};
use crate::web::state::AppState;
use veridoc_core::domain::{
    AnalysisInput, ChatMessage, Document, DocumentMetadata, ReportLanguage, RiskAnalysis,
    VerificationReport,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        verify_document_handler,
        redact_document_handler,
        analyze_document_handler,
        upload_document_handler,
        list_documents_handler,
        chat_handler,
        health_handler,
    ),
    components(
        schemas(
            VerificationReportDto,
            RedactResponse,
            AnalyzeResponse,
            UploadResponse,
            DocumentMetadataDto,
            RiskAnalysisDto,
            ChatResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "VeriDoc API", description = "Document verification, redaction, and analysis endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The JSON shape of a verification report (returned when `format=json`).
#[derive(Serialize, ToSchema)]
pub struct VerificationReportDto {
    report_id: Uuid,
    filename: String,
    verification_status: String,
    confidence_score: u8,
    summary: String,
    analysis_details: String,
    extracted_text: String,
    verified_at: DateTime<Utc>,
}

impl From<VerificationReport> for VerificationReportDto {
    fn from(report: VerificationReport) -> Self {
        Self {
            report_id: report.report_id,
            filename: report.filename,
            verification_status: report.verification_status.label().to_string(),
            confidence_score: report.confidence_score,
            summary: report.summary,
            analysis_details: report.analysis_details,
            extracted_text: report.extracted_text,
            verified_at: report.verified_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RedactResponse {
    filename: String,
    profile: String,
    /// Number of pattern-rule matches replaced.
    redaction_count: usize,
    redacted_text: String,
}

#[derive(Serialize, ToSchema)]
pub struct RiskAnalysisDto {
    risk_score: f32,
    issues_found: Vec<String>,
    recommendations: Vec<String>,
}

impl From<RiskAnalysis> for RiskAnalysisDto {
    fn from(risk: RiskAnalysis) -> Self {
        Self {
            risk_score: risk.risk_score,
            issues_found: risk.issues_found,
            recommendations: risk.recommendations,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    filename: String,
    document_type: String,
    summary: String,
    risks: RiskAnalysisDto,
    redacted_text: String,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    document_id: Uuid,
    storage_url: String,
    summary: Option<String>,
    risk_analysis: Option<RiskAnalysisDto>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentMetadataDto {
    id: Uuid,
    filename: String,
    document_type: String,
    mime_type: String,
    storage_url: String,
    uploaded_at: DateTime<Utc>,
    ai_summary: Option<String>,
    risk_analysis: Option<RiskAnalysisDto>,
}

impl From<DocumentMetadata> for DocumentMetadataDto {
    fn from(meta: DocumentMetadata) -> Self {
        Self {
            id: meta.id,
            filename: meta.filename,
            document_type: meta.document_type,
            mime_type: meta.mime_type,
            storage_url: meta.storage_url,
            uploaded_at: meta.uploaded_at,
            ai_summary: meta.ai_summary,
            risk_analysis: meta.risk_analysis.map(RiskAnalysisDto::from),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    answer: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

//=========================================================================================
// Multipart Form Parsing
//=========================================================================================

/// One uploaded file part, with the declared content type preserved.
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Drains a multipart stream into the (optional) `file` part and a map of
/// the remaining text fields.
async fn collect_form(
    mut multipart: Multipart,
) -> Result<(Option<UploadedFile>, HashMap<String, String>), ApiError> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart request: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("untitled").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file part: {e}")))?;
            file = Some(UploadedFile {
                filename,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field '{name}': {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok((file, fields))
}

fn require_file(file: Option<UploadedFile>) -> Result<UploadedFile, ApiError> {
    file.ok_or_else(|| ApiError::Validation("Multipart form must include a 'file' part".to_string()))
}

/// Looks up a mandatory text field, rejecting missing or blank values.
fn require_field(fields: &HashMap<String, String>, name: &str) -> Result<String, ApiError> {
    fields
        .get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or_else(|| ApiError::Validation(format!("A non-empty '{name}' field is required")))
}

/// Builds a domain `Document` from an uploaded file, resolving the
/// declared MIME type. Unsupported types surface as 400.
fn to_document(file: &UploadedFile) -> Result<Document, ApiError> {
    let mime_type = resolve_mime(&file.content_type)?;
    Ok(Document {
        filename: file.filename.clone(),
        mime_type,
        raw_bytes: file.bytes.clone(),
    })
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Verify an uploaded document and return a report.
///
/// Accepts a multipart form with a `file` part, a `description` of what
/// the document claims to be, an optional `output_language`
/// (full language name, defaults to English), and an optional `format`
/// of `pdf` (default) or `json`.
#[utoipa::path(
    post,
    path = "/documents/verify",
    request_body(content_type = "multipart/form-data", description = "The document to verify."),
    responses(
        (status = 200, description = "Verification report (PDF attachment or JSON)", body = VerificationReportDto),
        (status = 400, description = "Unsupported file type or malformed request"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn verify_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (file, fields) = collect_form(multipart).await?;
    let file = require_file(file)?;
    let document = to_document(&file)?;

    let description = require_field(&fields, "description")?;
    // An unrecognized language name degrades to English rather than
    // failing the request.
    let language = fields
        .get("output_language")
        .and_then(|name| ReportLanguage::from_name(name))
        .unwrap_or_default();
    let as_json = fields.get("format").map(String::as_str) == Some("json");

    info!(
        user_id = %user_id,
        filename = %document.filename,
        language = language.name(),
        "verification requested"
    );

    let report = state.pipeline.verify(&document, &description, language).await?;

    // Best-effort archival of the redacted text; a storage failure must
    // not cost the caller their report.
    let key = object_key(user_id, &format!("{}.txt", file.filename));
    if let Err(e) = state
        .storage
        .put_object(&key, report.extracted_text.as_bytes(), "text/plain")
        .await
    {
        warn!(key = %key, error = %e, "failed to archive redacted text");
    }

    if as_json {
        return Ok(Json(VerificationReportDto::from(report)).into_response());
    }

    let pdf_name = report_filename(language.code(), &file.filename);
    let pdf_bytes = render_report(&report)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{pdf_name}\""),
            ),
        ],
        pdf_bytes,
    )
        .into_response())
}

/// Redact PII from an uploaded document.
///
/// The `profile` field selects `pattern` (default, deterministic rules)
/// or `semantic` (pattern pass followed by an LLM pass). Semantic
/// failures here are surfaced to the caller, unlike inside the
/// verification pipeline.
#[utoipa::path(
    post,
    path = "/documents/redact",
    request_body(content_type = "multipart/form-data", description = "The document to redact."),
    responses(
        (status = 200, description = "Redacted text", body = RedactResponse),
        (status = 400, description = "Unsupported file type or unknown profile"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn redact_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<Json<RedactResponse>, ApiError> {
    let (file, fields) = collect_form(multipart).await?;
    let file = require_file(file)?;
    let document = to_document(&file)?;

    let profile = fields
        .get("profile")
        .map(String::as_str)
        .unwrap_or("pattern");
    if profile != "pattern" && profile != "semantic" {
        return Err(ApiError::Validation(format!(
            "Unknown redaction profile '{profile}' (expected 'pattern' or 'semantic')"
        )));
    }

    info!(user_id = %user_id, filename = %document.filename, profile, "redaction requested");

    let text = state
        .extractor
        .extract(&document.raw_bytes, document.mime_type, &document.filename)
        .await?;

    let redaction_count = state.redactor.match_count(&text);
    let mut redacted = state.redactor.redact(&text);
    if profile == "semantic" {
        redacted = state.semantic_redactor.redact(&redacted).await?;
    }

    Ok(Json(RedactResponse {
        filename: file.filename,
        profile: profile.to_string(),
        redaction_count,
        redacted_text: redacted,
    }))
}

/// Summarize a document and assess its risks, without persisting anything.
///
/// Text is pattern-redacted before it is sent to the analysis provider.
#[utoipa::path(
    post,
    path = "/documents/analyze",
    request_body(content_type = "multipart/form-data", description = "The document to analyze."),
    responses(
        (status = 200, description = "Summary and risk assessment", body = AnalyzeResponse),
        (status = 400, description = "Unsupported file type or malformed request"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn analyze_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (file, fields) = collect_form(multipart).await?;
    let file = require_file(file)?;
    let document = to_document(&file)?;

    let document_type = fields
        .get("document_type")
        .cloned()
        .unwrap_or_else(|| "general".to_string());

    info!(user_id = %user_id, filename = %document.filename, document_type, "analysis requested");

    let text = state
        .extractor
        .extract(&document.raw_bytes, document.mime_type, &document.filename)
        .await?;
    let redacted = state.redactor.redact(&text);

    let summary = state.summarizer.summarize(&redacted, &document_type).await?;
    let risks = state.risk.assess(&redacted, &document_type).await?;

    Ok(Json(AnalyzeResponse {
        filename: file.filename,
        document_type,
        summary,
        risks: risks.into(),
        redacted_text: redacted,
    }))
}

/// Upload a document into the user's library.
///
/// The original bytes go to object storage, a metadata row is created,
/// and a summary plus risk assessment are computed over the redacted
/// text. Analysis is best-effort: a provider failure leaves the stored
/// document without analysis rather than failing the upload.
#[utoipa::path(
    post,
    path = "/documents/upload",
    request_body(content_type = "multipart/form-data", description = "The document to store."),
    responses(
        (status = 201, description = "Document stored", body = UploadResponse),
        (status = 400, description = "Unsupported file type or malformed request"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (file, fields) = collect_form(multipart).await?;
    let file = require_file(file)?;
    let document = to_document(&file)?;

    let document_type = fields
        .get("document_type")
        .cloned()
        .unwrap_or_else(|| "general".to_string());

    info!(user_id = %user_id, filename = %document.filename, "upload requested");

    // Storage failures here are fatal to the request: without the stored
    // original there is nothing worth recording.
    let key = object_key(user_id, &file.filename);
    let storage_url = state
        .storage
        .put_object(&key, &document.raw_bytes, &file.content_type)
        .await?;

    let metadata = DocumentMetadata {
        id: Uuid::new_v4(),
        user_id,
        filename: file.filename.clone(),
        document_type: document_type.clone(),
        mime_type: document.mime_type.as_str().to_string(),
        storage_url: storage_url.clone(),
        uploaded_at: Utc::now(),
        ai_summary: None,
        risk_analysis: None,
    };
    state.db.insert_document_metadata(&metadata).await?;

    let analysis = analyze_for_upload(&state, &document, &document_type).await;
    let (summary, risk_analysis) = match analysis {
        Ok((summary, risk)) => {
            state
                .db
                .update_document_analysis(metadata.id, &summary, &risk)
                .await?;
            (Some(summary), Some(risk))
        }
        Err(e) => {
            warn!(document_id = %metadata.id, error = %e, "upload analysis failed");
            (None, None)
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            document_id: metadata.id,
            storage_url,
            summary,
            risk_analysis: risk_analysis.map(RiskAnalysisDto::from),
        }),
    ))
}

/// The extract -> redact -> summarize -> assess sequence shared by the
/// upload path, kept fallible as a unit.
async fn analyze_for_upload(
    state: &AppState,
    document: &Document,
    document_type: &str,
) -> Result<(String, RiskAnalysis), ApiError> {
    let text = state
        .extractor
        .extract(&document.raw_bytes, document.mime_type, &document.filename)
        .await?;
    let redacted = state.redactor.redact(&text);
    let summary = state.summarizer.summarize(&redacted, document_type).await?;
    let risk = state.risk.assess(&redacted, document_type).await?;
    Ok((summary, risk))
}

/// List the caller's uploaded documents, newest first.
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "The user's documents", body = [DocumentMetadataDto]),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<DocumentMetadataDto>>, ApiError> {
    let documents = state.db.list_documents_for_user(user_id).await?;
    Ok(Json(
        documents.into_iter().map(DocumentMetadataDto::from).collect(),
    ))
}

/// Chat about documents, optionally attaching one.
///
/// Accepts a multipart form with a `prompt` field, an optional `history`
/// field (a JSON array of `{role, text}` turns), and an optional `file`
/// part. Image attachments are passed to the model directly; PDF, DOCX,
/// and plain-text attachments are converted to extracted text first.
#[utoipa::path(
    post,
    path = "/chat",
    request_body(content_type = "multipart/form-data", description = "The prompt, optional history, and optional attachment."),
    responses(
        (status = 200, description = "The assistant's reply", body = ChatResponse),
        (status = 400, description = "Missing prompt or malformed history"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let (file, fields) = collect_form(multipart).await?;

    let prompt = require_field(&fields, "prompt")?;

    let history: Vec<ChatMessage> = match fields.get("history") {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| ApiError::Validation(format!("Malformed 'history' field: {e}")))?,
        None => Vec::new(),
    };

    let attachment = match file {
        Some(file) => Some(to_attachment(&state, &file).await?),
        None => None,
    };

    info!(
        user_id = %user_id,
        history_turns = history.len(),
        has_attachment = attachment.is_some(),
        "chat requested"
    );

    let answer = state.chat.reply(&prompt, &history, attachment).await?;
    Ok(Json(ChatResponse { answer }))
}

/// Converts an uploaded chat attachment into an `AnalysisInput`: images
/// go to the model as-is, every other supported format as extracted text.
async fn to_attachment(state: &AppState, file: &UploadedFile) -> Result<AnalysisInput, ApiError> {
    let mime_type = resolve_mime(&file.content_type)?;
    if mime_type.is_image() {
        return Ok(AnalysisInput::Image {
            bytes: file.bytes.clone(),
            mime: mime_type,
        });
    }
    let text = state
        .extractor
        .extract(&file.bytes, mime_type, &file.filename)
        .await?;
    Ok(AnalysisInput::Text(text))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_description_is_rejected() {
        let fields = HashMap::new();
        let err = require_field(&fields, "description").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut fields = HashMap::new();
        fields.insert("description".to_string(), "   ".to_string());
        let err = require_field(&fields, "description").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn present_description_passes_through() {
        let mut fields = HashMap::new();
        fields.insert("description".to_string(), "A rental invoice".to_string());
        assert_eq!(
            require_field(&fields, "description").unwrap(),
            "A rental invoice"
        );
    }
}
