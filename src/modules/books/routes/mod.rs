use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use libris_http::{error::AppError, extract::JsonBody};
use serde::{Deserialize, Serialize};

use super::catalog::SharedCatalog;
use super::models::{Book, EditBook, Genre, NewBook, ValidationError};
use super::views::{filter_books, genre_universe, BookFilter, Selection};

/// Record as served over HTTP, with the resolved cover image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub cover_image: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let cover_image = book.cover_image();
        Self { book, cover_image }
    }
}

/// Query string for the filtered listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn into_filter(self) -> Result<BookFilter, AppError> {
        Ok(BookFilter {
            search: self.search.unwrap_or_default(),
            genre: parse_selection(self.genre)?,
            status: parse_selection(self.status)?,
        })
    }
}

fn parse_selection<T>(raw: Option<String>) -> Result<Selection<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.as_deref() {
        None | Some("") => Ok(Selection::All),
        Some(value) => value
            .parse()
            .map_err(|err: T::Err| AppError::bad_request(err.to_string())),
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::required_field(err.field)
    }
}

fn book_not_found(id: &str) -> AppError {
    AppError::not_found(format!("book '{id}' not found"))
}

/// Routes mounted under `/api/books`.
pub fn router(catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/genres", get(list_genres))
        .route("/health", get(health_check))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/{id}/toggle-status", post(toggle_status))
        .with_state(catalog)
}

async fn list_books(
    State(catalog): State<SharedCatalog>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let filter = query.into_filter()?;
    let catalog = catalog.read().await;
    let books = filter_books(catalog.list(), &filter)
        .into_iter()
        .cloned()
        .map(BookResponse::from)
        .collect();
    Ok(Json(books))
}

async fn list_genres(State(catalog): State<SharedCatalog>) -> Json<Vec<Selection<Genre>>> {
    Json(genre_universe(catalog.read().await.list()))
}

async fn create_book(
    State(catalog): State<SharedCatalog>,
    JsonBody(draft): JsonBody<NewBook>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    draft.validate()?;
    let book = catalog.write().await.add(draft);
    tracing::info!(id = %book.id, title = %book.title, "book added");
    Ok((StatusCode::CREATED, Json(book.into())))
}

async fn get_book(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let catalog = catalog.read().await;
    let book = catalog.get(&id).cloned().ok_or_else(|| book_not_found(&id))?;
    Ok(Json(book.into()))
}

async fn update_book(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
    JsonBody(edit): JsonBody<EditBook>,
) -> Result<Json<BookResponse>, AppError> {
    edit.validate()?;
    let mut catalog = catalog.write().await;
    let existing = catalog.get(&id).ok_or_else(|| book_not_found(&id))?;
    let updated = edit.apply_to(existing);
    catalog.update(updated.clone());
    tracing::info!(id = %updated.id, "book updated");
    Ok(Json(updated.into()))
}

async fn toggle_status(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = catalog
        .write()
        .await
        .toggle_status(&id)
        .ok_or_else(|| book_not_found(&id))?;
    tracing::info!(id = %book.id, status = %book.status, "book status toggled");
    Ok(Json(book.into()))
}

async fn delete_book(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if catalog.write().await.delete(&id) {
        tracing::info!(%id, "book deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(book_not_found(&id))
    }
}

async fn health_check(State(catalog): State<SharedCatalog>) -> String {
    if catalog.read().await.is_persisted() {
        "books module is healthy".to_string()
    } else {
        "books module is running in memory-only mode".to_string()
    }
}
