//! Required-field rules for creation payloads.
//!
//! Presence is all that is checked: a field passes when it is present and not
//! `null`, whatever its type. The only exception is `asin`, which has to be a
//! string because it addresses the book in URLs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use super::error::BookError;

/// One violated rule, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewBookPayload {
    #[validate(required(message = "Title is required!"))]
    pub title: Option<Value>,
    #[validate(required(message = "Category is required!"))]
    pub category: Option<Value>,
    #[validate(required(message = "Price is required!"))]
    pub price: Option<Value>,
    #[validate(required(message = "Asin is required!"))]
    pub asin: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A creation payload that passed every rule.
#[derive(Debug)]
pub struct ValidBook {
    pub asin: String,
    /// Every payload field except `asin`, in caller order
    pub fields: Map<String, Value>,
}

impl NewBookPayload {
    pub fn parse(payload: Value) -> Result<ValidBook, BookError> {
        let payload: NewBookPayload = from_body(payload)?;
        payload.validate()?;

        let asin = match payload.asin {
            Some(Value::String(asin)) => asin,
            _ => {
                return Err(BookError::Validation(vec![FieldViolation::new(
                    "asin",
                    "Asin must be a string!",
                )]))
            }
        };

        let mut fields = Map::new();
        for (key, value) in [
            ("title", payload.title),
            ("category", payload.category),
            ("price", payload.price),
        ] {
            if let Some(value) = value {
                fields.insert(key.to_string(), value);
            }
        }
        fields.extend(
            payload
                .extra
                .into_iter()
                .filter(|(key, _)| key != "comments" && key != "createdAt"),
        );

        Ok(ValidBook { asin, fields })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewCommentPayload {
    #[validate(required(message = "Text is required!"))]
    pub text: Option<Value>,
    #[serde(rename = "userName")]
    #[validate(required(message = "User name is required!"))]
    pub user_name: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewCommentPayload {
    /// Validate and return the caller fields to store on the new comment.
    pub fn parse(payload: Value) -> Result<Map<String, Value>, BookError> {
        let payload: NewCommentPayload = from_body(payload)?;
        payload.validate()?;

        let mut fields = Map::new();
        if let Some(text) = payload.text {
            fields.insert("text".to_string(), text);
        }
        if let Some(user_name) = payload.user_name {
            fields.insert("userName".to_string(), user_name);
        }
        fields.extend(
            payload
                .extra
                .into_iter()
                .filter(|(key, _)| key != "commentID" && key != "createdAt"),
        );

        Ok(fields)
    }
}

/// Partial updates accept any object; only `asin` is type-checked.
pub fn parse_update(payload: Value) -> Result<Map<String, Value>, BookError> {
    let Value::Object(patch) = payload else {
        return Err(BookError::Validation(vec![FieldViolation::new(
            "body",
            "Request body must be a JSON object",
        )]));
    };

    if matches!(patch.get("asin"), Some(value) if !value.is_string()) {
        return Err(BookError::Validation(vec![FieldViolation::new(
            "asin",
            "Asin must be a string!",
        )]));
    }

    Ok(patch)
}

fn from_body<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, BookError> {
    if !payload.is_object() {
        return Err(BookError::Validation(vec![FieldViolation::new(
            "body",
            "Request body must be a JSON object",
        )]));
    }
    serde_json::from_value(payload)
        .map_err(|e| BookError::Validation(vec![FieldViolation::new("body", e.to_string())]))
}

impl From<ValidationErrors> for BookError {
    fn from(errors: ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    FieldViolation::new(field.clone(), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        BookError::Validation(violations)
    }
}
