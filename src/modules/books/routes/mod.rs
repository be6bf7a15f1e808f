use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde_json::Value;

use super::models::{Book, CategoryFilter, Comment, CreatedBook};
use super::service::BookService;

/// HTTP routes of the books module, relative to its mount point.
pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{asin}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{asin}/comments", get(list_comments).post(add_comment))
        .route("/{asin}/comments/{comment_id}", delete(delete_comment))
        .with_state(service)
}

/// GET /
///
/// The query string is read as raw pairs so a repeated `category` filters
/// instead of failing.
async fn list_books(
    State(service): State<BookService>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Query(pairs) = query?;
    let books = service.list(&CategoryFilter::from_query(&pairs)).await?;
    Ok(Json(books))
}

/// GET /{asin}
async fn get_book(
    State(service): State<BookService>,
    Path(asin): Path<String>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(service.get(&asin).await?))
}

/// POST /
async fn create_book(
    State(service): State<BookService>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedBook>), AppError> {
    let Json(payload) = payload?;
    let asin = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(CreatedBook { asin })))
}

/// PUT /{asin}
///
/// Responds with the whole collection after the merge.
async fn update_book(
    State(service): State<BookService>,
    Path(asin): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(service.update(&asin, payload).await?))
}

/// DELETE /{asin}
async fn delete_book(
    State(service): State<BookService>,
    Path(asin): Path<String>,
) -> Result<StatusCode, AppError> {
    service.delete(&asin).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{asin}/comments
async fn list_comments(
    State(service): State<BookService>,
    Path(asin): Path<String>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(service.list_comments(&asin).await?))
}

/// POST /{asin}/comments
async fn add_comment(
    State(service): State<BookService>,
    Path(asin): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Comment>>), AppError> {
    let Json(payload) = payload?;
    let comments = service.add_comment(&asin, payload).await?;
    Ok((StatusCode::CREATED, Json(comments)))
}

/// DELETE /{asin}/comments/{comment_id}
async fn delete_comment(
    State(service): State<BookService>,
    Path((asin, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    service.delete_comment(&asin, &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
