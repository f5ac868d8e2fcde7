use std::io;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use super::AppState;
use super::schemas::{FileResponse, ListParams, ListResponse};
use crate::error::ApiError;

/// multipart 内でファイル本体を運ぶフィールド名
const FILE_FIELD: &str = "file";

/// `POST /files` -- multipart upload of a single `file` field.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Multipart(e.body_text()))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        // パートの Content-Length が無ければ申告サイズは 0 とし、実測で上限を守る
        let declared_size = field
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let content = field.map_err(io::Error::other).boxed();
        let record = state
            .service
            .upload(&name, &content_type, content, declared_size)
            .await?;

        let url = state.download_url(&record.id.to_string());
        return Ok((
            StatusCode::CREATED,
            Json(FileResponse::from_record(&record, url)),
        ));
    }

    Err(ApiError::MissingFile)
}

/// `GET /files/{id}`
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let record = state.service.describe(&id).await?;
    let url = state.download_url(&record.id.to_string());
    Ok(Json(FileResponse::from_record(&record, url)))
}

/// `GET /files/{id}/download` -- streams the stored bytes.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (record, content) = state.service.fetch(&id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.content_type.as_str())
        .header(header::CONTENT_LENGTH, record.size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", record.name),
        )
        .body(Body::from_stream(content))
        .map_err(|e| ApiError::Response(e.to_string()))
}

/// `GET /files?page=&per_page=` -- newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let (page, per_page) = params.parsed();
    let result = state.service.list_paginated(page, per_page).await?;
    Ok(Json(ListResponse::from_page(&result, |record| {
        state.download_url(&record.id.to_string())
    })))
}
