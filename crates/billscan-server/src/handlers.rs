//! HTTP request handlers.

use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use billscan_core::ocr::sniff_mime;
use billscan_core::{BillResponse, BillscanError, ExtractedFields, OcrError};

use super::{ApiError, AppState};

/// Build all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/process_bill", post(process_bill))
        .route("/classify", post(classify))
        .route("/ocr", post(ocr_upload))
        .route("/ocr/", post(ocr_upload))
        .route("/process_image", post(process_image))
        .route("/extract", post(extract_with_llm))
}

/// `{ "text": ... }` body shared by the text endpoints.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

fn text_body(body: Result<Json<TextRequest>, JsonRejection>) -> Result<String, ApiError> {
    match body {
        Ok(Json(request)) => Ok(request.text),
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    }
}

async fn run_extractor(state: &AppState, text: String) -> Result<ExtractedFields, ApiError> {
    let extractor = state.extractor.clone();
    let fields = tokio::task::spawn_blocking(move || extractor.extract(&text))
        .await
        .map_err(|e| BillscanError::Task(e.to_string()))??;
    Ok(fields)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.mode(),
    }))
}

async fn process_bill(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<BillResponse>, ApiError> {
    let text = text_body(body)?;
    let start = Instant::now();

    let fields = run_extractor(&state, text).await?;

    info!("Processed bill ({}) in {:?}", fields.mode, start.elapsed());
    Ok(Json(fields.to_response()))
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub service: &'static str,
    pub category: String,
    pub confidence: f32,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub merchant: Option<String>,
    pub status: &'static str,
}

async fn classify(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let text = text_body(body)?;

    let base = state.rules.extract_base(&text);
    let category = state.rules.classify_category(&text);

    Ok(Json(ClassifyResponse {
        service: "classifier",
        category: category.value.unwrap_or_default(),
        confidence: category.confidence.unwrap_or_default(),
        amount: base.amount_value,
        date: base.date.value,
        merchant: base.merchant.value,
        status: "success",
    }))
}

/// One uploaded file.
struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Read the first multipart part named in `names`.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    names: &[&str],
) -> Result<Upload, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if !names.contains(&name.as_str()) {
            debug!("Ignoring multipart field '{}'", name);
            continue;
        }

        let filename = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;

        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::Validation(format!(
        "missing multipart field '{}'",
        names.join("' or '")
    )))
}

async fn ocr_text(state: &AppState, bytes: Vec<u8>) -> Result<String, ApiError> {
    let ocr = state.ocr.as_ref().ok_or(OcrError::Disabled)?;
    Ok(ocr.extract_text(bytes).await?)
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub filename: Option<String>,
    pub text: String,
}

async fn ocr_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>, ApiError> {
    let upload = read_upload(multipart, &["file"]).await?;
    let text = ocr_text(&state, upload.bytes).await?;

    Ok(Json(OcrResponse {
        filename: upload.filename,
        text,
    }))
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    #[serde(flatten)]
    pub fields: BillResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

async fn process_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let upload = read_upload(multipart, &["image", "file"]).await?;
    let image_type = upload
        .content_type
        .clone()
        .filter(|ct| ct.starts_with("image/"))
        .or_else(|| sniff_mime(&upload.bytes).map(String::from));

    let text = ocr_text(&state, upload.bytes).await?;
    let fields = run_extractor(&state, text.clone()).await?;

    let mut response = fields.to_response();
    response.raw_text = Some(text);

    Ok(Json(ImageResponse {
        fields: response,
        image_type,
    }))
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub extracted_data: String,
}

async fn extract_with_llm(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let text = text_body(body)?;
    let extracted_data = state.llm.extract(&text).await?;
    Ok(Json(GenerationResponse { extracted_data }))
}
