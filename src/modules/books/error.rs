use bookshelf_db::StoreError;
use bookshelf_http::error::AppError;
use serde_json::json;
use thiserror::Error;

use super::validation::FieldViolation;

/// Outcome of a failed books or comments operation.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Book already in db")]
    Conflict { asin: String },

    #[error("book '{asin}' not found")]
    BookNotFound { asin: String },

    #[error("comment '{comment_id}' not found on book '{asin}'")]
    CommentNotFound { asin: String, comment_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let message = err.to_string();
        match err {
            BookError::Validation(violations) => {
                let details = violations
                    .iter()
                    .map(|v| json!({ "field": v.field, "message": v.message }))
                    .collect();
                AppError::validation(details, "Validation failed")
            }
            BookError::Conflict { asin } => AppError::conflict(vec![json!({ "asin": asin })], message),
            BookError::BookNotFound { .. } | BookError::CommentNotFound { .. } => {
                AppError::not_found(message)
            }
            BookError::Store(source) => {
                AppError::Internal(anyhow::Error::new(source).context("books collection store failed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn variants_map_to_expected_statuses() {
        let cases = [
            (
                BookError::Validation(vec![FieldViolation::new("title", "Title is required!")]),
                StatusCode::BAD_REQUEST,
            ),
            (
                BookError::Conflict {
                    asin: "X1".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BookError::BookNotFound {
                    asin: "X1".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                BookError::CommentNotFound {
                    asin: "X1".to_string(),
                    comment_id: "c1".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                BookError::Store(StoreError::Unavailable("disk gone".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn conflict_keeps_the_duplicate_message() {
        let err = AppError::from(BookError::Conflict {
            asin: "X1".to_string(),
        });
        match err {
            AppError::Conflict { message, details, .. } => {
                assert_eq!(message, "Book already in db");
                assert_eq!(details, vec![json!({"asin": "X1"})]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
