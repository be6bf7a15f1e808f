pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use bookshelf_db::{CollectionStore, JsonFileStore};
use bookshelf_kernel::{settings::StorageSettings, InitCtx, Module};
use serde_json::json;

use models::Book;
use service::BookService;

/// Books module: the books collection and the comments nested under each book
pub struct BooksModule {
    service: BookService,
    file_store: Option<Arc<JsonFileStore<Book>>>,
}

impl BooksModule {
    /// Serve books from an arbitrary store
    pub fn new(store: Arc<dyn CollectionStore<Book>>) -> Self {
        Self {
            service: BookService::new(store),
            file_store: None,
        }
    }

    /// Serve books from the JSON file named in the storage settings
    pub fn from_settings(storage: &StorageSettings) -> Self {
        let file_store = Arc::new(JsonFileStore::new(&storage.books_path));
        Self {
            service: BookService::new(file_store.clone()),
            file_store: Some(file_store),
        }
    }

    pub fn service(&self) -> &BookService {
        &self.service
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if let Some(file_store) = &self.file_store {
            let created = file_store.ensure_exists().await.with_context(|| {
                format!(
                    "failed to prepare books file {}",
                    file_store.path().display()
                )
            })?;
            tracing::info!(
                module = self.name(),
                path = %file_store.path().display(),
                created,
                "books collection file ready"
            );
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn path_param(name: &str, description: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "string" }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_ref = json!({ "$ref": "#/components/schemas/Book" });
    let books_array = json!({ "type": "array", "items": book_ref });
    let comments_array = json!({
        "type": "array",
        "items": { "$ref": "#/components/schemas/Comment" }
    });
    let asin_param = path_param("asin", "Caller-supplied book identifier");
    let internal = error_response("Storage failure");

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "category",
                        "in": "query",
                        "required": false,
                        "description": "Exact, case-sensitive category match",
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": json_response("List of books", books_array.clone()),
                        "500": internal
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": json_response("Book created", json!({
                            "type": "object",
                            "properties": { "asin": { "type": "string" } },
                            "required": ["asin"]
                        })),
                        "400": error_response("Missing required fields or duplicate asin"),
                        "500": internal
                    }
                }
            },
            "/{asin}": {
                "parameters": [asin_param],
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("The book", book_ref),
                        "404": error_response("Book not found"),
                        "500": internal
                    }
                },
                "put": {
                    "summary": "Partially update a book",
                    "description": "Shallow-merges the body onto the book and returns the whole collection.",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "type": "object" } } }
                    },
                    "responses": {
                        "200": json_response("Updated collection", books_array),
                        "400": error_response("Body is not an object or asin already taken"),
                        "404": error_response("Book not found"),
                        "500": internal
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book not found"),
                        "500": internal
                    }
                }
            },
            "/{asin}/comments": {
                "parameters": [asin_param],
                "get": {
                    "summary": "List comments of a book",
                    "tags": ["Comments"],
                    "responses": {
                        "200": json_response("Comments, possibly empty", comments_array.clone()),
                        "404": error_response("Book not found"),
                        "500": internal
                    }
                },
                "post": {
                    "summary": "Add a comment to a book",
                    "tags": ["Comments"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateComment" }
                            }
                        }
                    },
                    "responses": {
                        "201": json_response("Updated comments", comments_array),
                        "400": error_response("Missing required fields"),
                        "404": error_response("Book not found"),
                        "500": internal
                    }
                }
            },
            "/{asin}/comments/{commentID}": {
                "parameters": [
                    asin_param,
                    path_param("commentID", "Generated comment identifier")
                ],
                "delete": {
                    "summary": "Delete a comment",
                    "tags": ["Comments"],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book or comment not found"),
                        "500": internal
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "additionalProperties": true,
                    "properties": {
                        "asin": { "type": "string" },
                        "title": { "type": "string" },
                        "category": { "type": "string" },
                        "price": { "oneOf": [{ "type": "number" }, { "type": "string" }] },
                        "comments": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Comment" }
                        },
                        "createdAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["asin", "comments"]
                },
                "CreateBook": {
                    "type": "object",
                    "additionalProperties": true,
                    "properties": {
                        "asin": { "type": "string" },
                        "title": { "type": "string" },
                        "category": { "type": "string" },
                        "price": { "oneOf": [{ "type": "number" }, { "type": "string" }] }
                    },
                    "required": ["title", "category", "price", "asin"]
                },
                "Comment": {
                    "type": "object",
                    "additionalProperties": true,
                    "properties": {
                        "commentID": { "type": "string" },
                        "text": { "type": "string" },
                        "userName": { "type": "string" },
                        "createdAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["commentID"]
                },
                "CreateComment": {
                    "type": "object",
                    "additionalProperties": true,
                    "properties": {
                        "text": { "type": "string" },
                        "userName": { "type": "string" }
                    },
                    "required": ["text", "userName"]
                }
            }
        }
    })
}

/// Create the books module backed by the configured JSON file
pub fn create_module(storage: &StorageSettings) -> Arc<dyn Module> {
    Arc::new(BooksModule::from_settings(storage))
}
