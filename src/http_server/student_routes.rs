//! Student HTTP Routes
//!
//! CRUD endpoints over the record store. Bodies are taken as raw JSON and
//! validated by the store, so field-level errors name the offending key.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ApiError, ApiResult};
use crate::students::{Page, Student, StudentStore};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertedResponse {
    pub inserted_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

// ==================
// Student Routes
// ==================

/// Create student routes
pub fn student_routes(store: Arc<StudentStore>) -> Router {
    Router::new()
        .route("/students", get(list_students_handler).post(create_student_handler))
        .route(
            "/students/:student_id",
            get(get_student_handler)
                .patch(update_student_handler)
                .delete(delete_student_handler),
        )
        .with_state(store)
}

fn body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ==================
// Handlers
// ==================

async fn create_student_handler(
    State(store): State<Arc<StudentStore>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertedResponse>)> {
    let document = body(payload)?;
    let inserted_id = store.insert_document(&document)?;
    Ok((StatusCode::CREATED, Json(InsertedResponse { inserted_id })))
}

async fn list_students_handler(
    State(store): State<Arc<StudentStore>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Student>>> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let page = Page::from_params(query.limit, query.skip)?;
    Ok(Json(store.list(page)?))
}

async fn get_student_handler(
    State(store): State<Arc<StudentStore>>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<Student>> {
    store
        .get(&student_id)?
        .map(Json)
        .ok_or(ApiError::NotFound(student_id))
}

async fn update_student_handler(
    State(store): State<Arc<StudentStore>>,
    Path(student_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<UpdatedResponse>> {
    let document = body(payload)?;
    let outcome = store.update_document(&student_id, &document)?;
    if outcome.matched_count == 0 {
        return Err(ApiError::NotFound(student_id));
    }
    Ok(Json(UpdatedResponse {
        matched: outcome.matched_count,
        modified: outcome.modified_count,
    }))
}

async fn delete_student_handler(
    State(store): State<Arc<StudentStore>>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let outcome = store.delete(&student_id)?;
    if outcome.deleted_count == 0 {
        return Err(ApiError::NotFound(student_id));
    }
    Ok(Json(DeletedResponse {
        deleted: outcome.deleted_count,
    }))
}
