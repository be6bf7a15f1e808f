//! Books and comments operations over a whole-collection store.
//!
//! Every operation loads the full collection, works on it in memory and, when
//! it changed something, saves the full collection back. Nothing serializes
//! concurrent read-modify-write cycles.

use std::sync::Arc;

use bookshelf_db::CollectionStore;
use serde_json::Value;

use super::error::BookError;
use super::models::{Book, CategoryFilter, Comment};
use super::validation::{self, NewBookPayload, NewCommentPayload};
use crate::utils;

const LOG_TARGET: &str = "bookshelf.books";

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn CollectionStore<Book>>,
}

impl BookService {
    pub fn new(store: Arc<dyn CollectionStore<Book>>) -> Self {
        Self { store }
    }

    /// Books passing `filter`, in stored order.
    pub async fn list(&self, filter: &CategoryFilter) -> Result<Vec<Book>, BookError> {
        let books = self.store.load().await?;
        Ok(books.into_iter().filter(|book| filter.matches(book)).collect())
    }

    pub async fn get(&self, asin: &str) -> Result<Book, BookError> {
        self.store
            .load()
            .await?
            .into_iter()
            .find(|book| book.asin == asin)
            .ok_or_else(|| not_found(asin))
    }

    /// Validate and append a new book, returning its `asin`.
    pub async fn create(&self, payload: Value) -> Result<String, BookError> {
        let valid = NewBookPayload::parse(payload)?;
        let mut books = self.store.load().await?;

        if books.iter().any(|book| book.asin == valid.asin) {
            tracing::info!(target: LOG_TARGET, asin = %valid.asin, "rejected duplicate book");
            return Err(BookError::Conflict { asin: valid.asin });
        }

        books.push(Book {
            fields: valid.fields,
            asin: valid.asin.clone(),
            comments: Vec::new(),
            created_at: Some(utils::timestamp_now()),
        });
        self.store.save(&books).await?;

        tracing::info!(target: LOG_TARGET, asin = %valid.asin, count = books.len(), "book created");
        Ok(valid.asin)
    }

    /// Shallow-merge `payload` onto the book and return the whole updated collection.
    pub async fn update(&self, asin: &str, payload: Value) -> Result<Vec<Book>, BookError> {
        let patch = validation::parse_update(payload)?;
        let mut books = self.store.load().await?;

        let index = position(&books, asin).ok_or_else(|| not_found(asin))?;

        if let Some(new_asin) = patch.get("asin").and_then(Value::as_str) {
            let taken = books
                .iter()
                .enumerate()
                .any(|(i, book)| i != index && book.asin == new_asin);
            if taken {
                return Err(BookError::Conflict {
                    asin: new_asin.to_string(),
                });
            }
        }

        books[index].merge(patch);
        self.store.save(&books).await?;

        tracing::info!(target: LOG_TARGET, asin, updated_asin = %books[index].asin, "book updated");
        Ok(books)
    }

    pub async fn delete(&self, asin: &str) -> Result<(), BookError> {
        let mut books = self.store.load().await?;

        let index = position(&books, asin).ok_or_else(|| not_found(asin))?;
        books.remove(index);
        self.store.save(&books).await?;

        tracing::info!(target: LOG_TARGET, asin, count = books.len(), "book deleted");
        Ok(())
    }

    /// Comments of a book, possibly empty.
    pub async fn list_comments(&self, asin: &str) -> Result<Vec<Comment>, BookError> {
        Ok(self.get(asin).await?.comments)
    }

    /// Validate and append a comment, returning the book's updated comments.
    pub async fn add_comment(&self, asin: &str, payload: Value) -> Result<Vec<Comment>, BookError> {
        let fields = NewCommentPayload::parse(payload)?;
        let mut books = self.store.load().await?;

        let index = position(&books, asin).ok_or_else(|| not_found(asin))?;
        let book = &mut books[index];

        let comment_id = loop {
            let candidate = utils::new_comment_id();
            if book.find_comment(&candidate).is_none() {
                break candidate;
            }
        };
        book.comments.push(Comment {
            fields,
            comment_id: comment_id.clone(),
            created_at: Some(utils::timestamp_now()),
        });
        let comments = book.comments.clone();

        self.store.save(&books).await?;

        tracing::info!(target: LOG_TARGET, asin, comment_id = %comment_id, "comment added");
        Ok(comments)
    }

    pub async fn delete_comment(&self, asin: &str, comment_id: &str) -> Result<(), BookError> {
        let mut books = self.store.load().await?;

        let index = position(&books, asin).ok_or_else(|| not_found(asin))?;
        let comments = &mut books[index].comments;
        let comment_index = comments
            .iter()
            .position(|c| c.comment_id == comment_id)
            .ok_or_else(|| BookError::CommentNotFound {
                asin: asin.to_string(),
                comment_id: comment_id.to_string(),
            })?;
        comments.remove(comment_index);

        self.store.save(&books).await?;

        tracing::info!(target: LOG_TARGET, asin, comment_id, "comment deleted");
        Ok(())
    }
}

fn position(books: &[Book], asin: &str) -> Option<usize> {
    books.iter().position(|book| book.asin == asin)
}

fn not_found(asin: &str) -> BookError {
    BookError::BookNotFound {
        asin: asin.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bookshelf_db::{MemoryStore, StoreError};
    use serde_json::json;

    fn service_with(books: Vec<Value>) -> (BookService, Arc<MemoryStore<Book>>) {
        let books = books
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect();
        let store = Arc::new(MemoryStore::with_items(books));
        (BookService::new(store.clone()), store)
    }

    fn payload(asin: &str, category: &str) -> Value {
        json!({"title": format!("Title {asin}"), "category": category, "price": 9.99, "asin": asin})
    }

    fn asins(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.asin.as_str()).collect()
    }

    struct BrokenStore;

    #[async_trait]
    impl CollectionStore<Book> for BrokenStore {
        async fn load(&self) -> Result<Vec<Book>, StoreError> {
            Err(StoreError::Unavailable("disk detached".to_string()))
        }

        async fn save(&self, _items: &[Book]) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk detached".to_string()))
        }
    }

    #[tokio::test]
    async fn created_book_gets_system_fields() {
        let (service, _) = service_with(vec![]);

        let asin = service.create(payload("X1", "fiction")).await.unwrap();
        assert_eq!(asin, "X1");

        let book = service.get("X1").await.unwrap();
        assert_eq!(book.field("title"), Some(&json!("Title X1")));
        assert_eq!(book.field("price"), Some(&json!(9.99)));
        assert!(book.comments.is_empty());
        assert!(book.created_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_asin_is_a_conflict_and_store_is_untouched() {
        let (service, store) = service_with(vec![payload("X1", "fiction")]);

        let err = service.create(payload("X1", "poetry")).await.unwrap_err();

        assert!(matches!(err, BookError::Conflict { ref asin } if asin == "X1"));
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_store() {
        let (service, store) = service_with(vec![]);

        let err = service
            .create(json!({"title": "A", "category": "fiction", "asin": "X1"}))
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::Validation(ref v) if v.len() == 1 && v[0].field == "price"));
        assert_eq!(store.save_count(), 0);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn category_filter_is_exact_and_case_sensitive() {
        let (service, _) = service_with(vec![
            payload("X1", "fiction"),
            payload("X2", "Fiction"),
            payload("X3", "fiction"),
            json!({"asin": "X4", "category": 1}),
        ]);

        let exactly = |c: &str| CategoryFilter::Exactly(c.to_string());

        let fiction = service.list(&exactly("fiction")).await.unwrap();
        assert_eq!(asins(&fiction), vec!["X1", "X3"]);

        assert_eq!(service.list(&CategoryFilter::Any).await.unwrap().len(), 4);
        assert!(service.list(&exactly("history")).await.unwrap().is_empty());
        assert!(service
            .list(&CategoryFilter::Unmatchable)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn update_merges_in_place_and_returns_collection() {
        let (service, store) = service_with(vec![
            payload("X1", "fiction"),
            payload("X2", "fiction"),
            payload("X3", "fiction"),
        ]);

        let books = service
            .update("X2", json!({"price": "12.50", "img": "x2.png"}))
            .await
            .unwrap();

        assert_eq!(asins(&books), vec!["X1", "X2", "X3"]);
        assert_eq!(books[1].field("price"), Some(&json!("12.50")));
        assert_eq!(books[1].field("img"), Some(&json!("x2.png")));
        assert_eq!(books[1].field("title"), Some(&json!("Title X2")));
        assert_eq!(store.snapshot().await, books);
    }

    #[tokio::test]
    async fn update_missing_book_is_not_found() {
        let (service, store) = service_with(vec![payload("X1", "fiction")]);

        let err = service.update("nope", json!({"price": 1})).await.unwrap_err();

        assert!(matches!(err, BookError::BookNotFound { .. }));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn update_cannot_steal_another_asin() {
        let (service, store) = service_with(vec![payload("X1", "fiction"), payload("X2", "fiction")]);

        let err = service.update("X2", json!({"asin": "X1"})).await.unwrap_err();
        assert!(matches!(err, BookError::Conflict { .. }));
        assert_eq!(store.save_count(), 0);

        let books = service.update("X2", json!({"asin": "X9"})).await.unwrap();
        assert_eq!(asins(&books), vec!["X1", "X9"]);
    }

    #[tokio::test]
    async fn delete_removes_only_the_target_and_keeps_order() {
        let (service, store) = service_with(vec![
            payload("X1", "fiction"),
            payload("X2", "fiction"),
            payload("X3", "fiction"),
        ]);

        service.delete("X2").await.unwrap();
        assert_eq!(asins(&store.snapshot().await), vec!["X1", "X3"]);

        let err = service.delete("X2").await.unwrap_err();
        assert!(matches!(err, BookError::BookNotFound { .. }));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn comments_are_appended_with_unique_ids_and_removed_individually() {
        let (service, _) = service_with(vec![payload("X1", "fiction")]);

        let first = service
            .add_comment("X1", json!({"text": "Loved it", "userName": "ann"}))
            .await
            .unwrap();
        let second = service
            .add_comment("X1", json!({"text": "Meh", "userName": "bob", "rate": 2}))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_ne!(second[0].comment_id, second[1].comment_id);
        assert_eq!(second[1].fields["rate"], json!(2));
        assert!(second[1].created_at.is_some());

        service
            .delete_comment("X1", &second[0].comment_id)
            .await
            .unwrap();

        let remaining = service.list_comments("X1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].comment_id, second[1].comment_id);
        assert_eq!(remaining[0].text(), Some("Meh"));
    }

    #[tokio::test]
    async fn comment_operations_on_missing_targets_are_not_found() {
        let (service, store) = service_with(vec![payload("X1", "fiction")]);

        assert!(matches!(
            service.list_comments("nope").await.unwrap_err(),
            BookError::BookNotFound { .. }
        ));
        assert!(matches!(
            service
                .add_comment("nope", json!({"text": "hi", "userName": "ann"}))
                .await
                .unwrap_err(),
            BookError::BookNotFound { .. }
        ));
        assert!(matches!(
            service.delete_comment("X1", "unknown-id").await.unwrap_err(),
            BookError::CommentNotFound { .. }
        ));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn empty_comment_list_is_returned_as_is() {
        let (service, _) = service_with(vec![payload("X1", "fiction")]);
        assert!(service.list_comments("X1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let service = BookService::new(Arc::new(BrokenStore));

        assert!(matches!(
            service.list(&CategoryFilter::Any).await.unwrap_err(),
            BookError::Store(_)
        ));
        assert!(matches!(
            service.create(payload("X1", "fiction")).await.unwrap_err(),
            BookError::Store(_)
        ));
    }
}
