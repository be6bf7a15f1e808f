use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A book record as persisted in the collection file.
///
/// Only `asin`, `comments` and `createdAt` are interpreted; every other field
/// supplied by the caller is kept verbatim in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Caller-supplied identifier, unique across the collection
    pub asin: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Set once at creation
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Book {
    /// String value of the `category` field, if it holds one.
    pub fn category(&self) -> Option<&str> {
        self.fields.get("category").and_then(Value::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Shallow-merge a partial update onto this record.
    ///
    /// `comments` and `createdAt` are system-owned and ignored. A string
    /// `asin` replaces the identifier; callers check uniqueness first.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            match key.as_str() {
                "comments" | "createdAt" => {}
                "asin" => {
                    if let Value::String(asin) = value {
                        self.asin = asin;
                    }
                }
                _ => {
                    self.fields.insert(key, value);
                }
            }
        }
    }

    pub fn find_comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.comment_id == comment_id)
    }
}

/// A comment owned by a [`Book`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "commentID")]
    pub comment_id: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Comment {
    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }
}

/// Category restriction of the list endpoint, read from its query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// No `category`, or an empty one
    #[default]
    Any,
    Exactly(String),
    /// `category` repeated; a list of values equals no single category
    Unmatchable,
}

impl CategoryFilter {
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let mut values = pairs
            .iter()
            .filter(|(key, _)| key == "category")
            .map(|(_, value)| value);

        match (values.next(), values.next()) {
            (None, _) => Self::Any,
            (Some(value), None) if value.is_empty() => Self::Any,
            (Some(value), None) => Self::Exactly(value.clone()),
            (Some(_), Some(_)) => Self::Unmatchable,
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(category) => book.category() == Some(category.as_str()),
            Self::Unmatchable => false,
        }
    }
}

/// Body returned after a book is created.
#[derive(Debug, Serialize)]
pub struct CreatedBook {
    pub asin: String,
}
