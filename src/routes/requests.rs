use std::path::PathBuf;

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::get_config;
use crate::entities::analysis_request::RequestStatus;
use crate::error::AppError;
use crate::pagination::PaginatedResponse;
use crate::repository;
use crate::routes::AppState;
use crate::services::coordinator::Submission;

#[derive(Serialize, ToSchema)]
pub struct SubmitResponse {
    pub request_id: Uuid,
    pub task_id: String,
    pub status: RequestStatus,
}

#[derive(Serialize, ToSchema, Clone)]
pub struct RequestResponse {
    pub id: Uuid,
    pub user_id: i64,
    pub region_id: Option<Uuid>,
    pub source_image_id: Uuid,
    pub algorithm_name: String,
    pub status: RequestStatus,
    pub created_at: chrono::NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultResponse>,
}

#[derive(Serialize, ToSchema, Clone)]
pub struct ResultResponse {
    pub id: Uuid,
    pub metadata: serde_json::Value,
    pub created_at: chrono::NaiveDateTime,
}

impl RequestResponse {
    fn from_models(
        request: crate::entities::analysis_request::Model,
        result: Option<crate::entities::result::Model>,
    ) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            region_id: request.region_id,
            source_image_id: request.source_image_id,
            algorithm_name: request.algorithm_name,
            status: request.status,
            created_at: request.created_at,
            result: result.map(|r| ResultResponse {
                id: r.id,
                metadata: r.metadata,
                created_at: r.created_at,
            }),
        }
    }
}

// Helper to keep uploaded names filesystem-safe
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/requests",
    tag = "Analysis Requests",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Analysis started", body = SubmitResponse),
        (status = 400, description = "Bad Request"),
        (status = 409, description = "A previous request is still in progress"),
        (status = 502, description = "Analysis service unavailable"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let mut user_id: Option<i64> = None;
    let mut username: Option<String> = None;
    let mut algorithm_id: Option<String> = None;
    let mut upload: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        match field.name() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid user_id field".to_string()))?;
                user_id = Some(text.parse().map_err(|_| {
                    AppError::BadRequest("user_id must be an integer".to_string())
                })?);
            }
            Some("username") => {
                username = field.text().await.ok().filter(|t| !t.is_empty());
            }
            Some("algorithm_id") => {
                algorithm_id = field.text().await.ok();
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|_| {
                    AppError::InternalServerError("Failed to read file bytes".to_string())
                })?;
                upload = Some((filename, data));
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::BadRequest("user_id field is required".to_string()))?;
    let algorithm_id = algorithm_id
        .ok_or_else(|| AppError::BadRequest("algorithm_id field is required".to_string()))?;
    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file field found".to_string()))?;

    let config = get_config();
    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to create download dir: {}", e)))?;
    let download_path = PathBuf::from(&config.download_dir)
        .join(format!("{}_{}", user_id, sanitize_file_name(&filename)));
    tokio::fs::write(&download_path, &data)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to store upload: {}", e)))?;

    let receipt = state
        .coordinator
        .submit(Submission {
            user_id,
            username,
            file_path: download_path,
            file_size: data.len() as u64,
            algorithm_id,
        })
        .await?;

    println!(
        "Requests | POST /requests | user={} | request={} | task={} | res=200",
        user_id, receipt.request_id, receipt.task_id
    );
    Ok(Json(SubmitResponse {
        request_id: receipt.request_id,
        task_id: receipt.task_id,
        status: RequestStatus::Processing,
    }))
}

#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "Analysis Requests",
    params(
        ("id" = Uuid, Path, description = "Analysis request id")
    ),
    responses(
        (status = 200, description = "Request with its result, if any", body = RequestResponse),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestResponse>, AppError> {
    let (request, result) = repository::find_request(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

    Ok(Json(RequestResponse::from_models(request, result)))
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RequestFilter {
    pub user_id: i64,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/requests",
    tag = "Analysis Requests",
    params(
        ("user_id" = i64, Query, description = "Owner of the requests"),
        ("status" = Option<String>, Query, description = "Filter by status (PENDING, PROCESSING, COMPLETED, ERROR)"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Newest-first page of the user's requests", body = PaginatedResponse<RequestResponse>),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(filter): Query<RequestFilter>,
) -> Result<Json<PaginatedResponse<RequestResponse>>, AppError> {
    let status = match &filter.status {
        Some(raw) => Some(RequestStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown status '{}'. Expected PENDING, PROCESSING, COMPLETED or ERROR",
                raw
            ))
        })?),
        None => None,
    };

    let page = filter.page.unwrap_or(1).max(1);
    let limit = filter.limit.unwrap_or(10).clamp(1, 100);

    let (rows, total_items, total_pages) =
        repository::list_requests(&state.db, filter.user_id, status, page, limit).await?;

    println!(
        "Requests | GET /requests | user={} | count={} | res=200",
        filter.user_id, total_items
    );
    Ok(Json(PaginatedResponse {
        data: rows
            .into_iter()
            .map(|r| RequestResponse::from_models(r, None))
            .collect(),
        total_items,
        total_pages,
        current_page: page,
        page_size: limit,
    }))
}
