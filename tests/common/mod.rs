use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use bookshelf_app::books::BooksModule;
use bookshelf_kernel::{settings::Settings, InitCtx, Module, ModuleRegistry};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a books collection file inside a private temp directory.
pub struct TestApp {
    pub router: Router,
    pub books_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.storage.books_path = dir.path().join("data/books.json");

        let module = Arc::new(BooksModule::from_settings(&settings.storage));
        module
            .init(&InitCtx {
                settings: &settings,
            })
            .await
            .unwrap();

        let mut registry = ModuleRegistry::new();
        registry.register(module).unwrap();

        Self {
            router: bookshelf_http::build_router(&registry, &settings),
            books_path: settings.storage.books_path.clone(),
            _dir: dir,
        }
    }

    /// Parsed contents of the collection file.
    pub fn stored(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(&self.books_path).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(empty(Method::GET, uri)).await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(empty(Method::DELETE, uri)).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(with_json(Method::POST, uri, body)).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(with_json(Method::PUT, uri, body)).await
    }
}

fn empty(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
