use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use weather_core::{CsvExport, QueryRequest, QueryService, SavedQuery};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: QueryService,
}

/// Saved-query routes, relative to the API prefix.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queries", get(list_queries).post(create_query))
        // Static segment wins over `{id}`.
        .route("/queries/export", get(export_all))
        .route("/queries/{id}", get(get_query).put(update_query).delete(delete_query))
        .route("/queries/{id}/export", get(export_one))
}

async fn create_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedQuery>), ApiError> {
    let request = request_body(payload)?;
    let saved = state
        .service
        .create(&request)
        .await
        .map_err(ApiError::surface)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn list_queries(State(state): State<AppState>) -> Result<Json<Vec<SavedQuery>>, ApiError> {
    let all = state
        .service
        .list()
        .await
        .map_err(|e| ApiError::generic(e, "Failed to get queries"))?;
    Ok(Json(all))
}

async fn get_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SavedQuery>, ApiError> {
    let query = state
        .service
        .get(&id)
        .await
        .map_err(|e| ApiError::generic(e, "Failed to get query"))?;
    Ok(Json(query))
}

async fn update_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<SavedQuery>, ApiError> {
    let request = request_body(payload)?;
    let updated = state
        .service
        .update(&id, &request)
        .await
        .map_err(ApiError::surface)?;
    Ok(Json(updated))
}

async fn delete_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .service
        .delete(&id)
        .await
        .map_err(|e| ApiError::generic(e, "Failed to delete query"))?;
    Ok(Json(json!({ "message": "Query deleted successfully" })))
}

async fn export_all(State(state): State<AppState>) -> Result<Response, ApiError> {
    let export = state
        .service
        .export_all()
        .await
        .map_err(|e| ApiError::generic(e, "Failed to export data"))?;
    Ok(csv_attachment(export))
}

async fn export_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let export = state
        .service
        .export_one(&id)
        .await
        .map_err(|e| ApiError::generic(e, "Failed to export query"))?;
    Ok(csv_attachment(export))
}

/// A body sent without a JSON content type (or no body at all) reads as an
/// empty request, so validation reports the missing fields.
fn request_body(
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<QueryRequest, ApiError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(QueryRequest::default()),
        Err(rejection) => Err(ApiError::from(rejection)),
    }
}

fn csv_attachment(export: CsvExport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response()
}
