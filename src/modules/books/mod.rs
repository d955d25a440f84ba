pub mod catalog;
pub mod models;
pub mod routes;
pub mod views;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Module};

use catalog::SharedCatalog;

/// Catalog module: record CRUD, checkout toggling, and filtered listings
pub struct BooksModule {
    catalog: SharedCatalog,
}

impl BooksModule {
    pub const fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let catalog = self.catalog.read().await;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = catalog.len(),
            data_dir = %ctx.settings.storage.data_dir.display(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = serde_json::json!({
            "description": "Error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let book_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Book" }
                    }
                }
            })
        };
        let id_param = serde_json::json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let genre_names: Vec<&str> = models::Genre::ALL.iter().map(|g| g.as_str()).collect();
        let status_names: Vec<&str> = models::BookStatus::ALL.iter().map(|s| s.as_str()).collect();

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books matching the search and filters",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "search", "in": "query", "schema": { "type": "string" } },
                            { "name": "genre", "in": "query", "schema": { "type": "string" } },
                            { "name": "status", "in": "query", "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Filtered books in catalog order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "400": error_response.clone()
                        }
                    },
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/NewBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": book_response("Created book"),
                            "422": error_response.clone()
                        }
                    }
                },
                "/genres": {
                    "get": {
                        "summary": "Genres present in the catalog, prefixed with All",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Genre universe",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "type": "string" } }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": book_response("Book"),
                            "404": error_response.clone()
                        }
                    },
                    "put": {
                        "summary": "Edit a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/EditBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": book_response("Updated book"),
                            "404": error_response.clone(),
                            "422": error_response.clone()
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error_response.clone()
                        }
                    }
                },
                "/{id}/toggle-status": {
                    "post": {
                        "summary": "Check a book out or return it",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": book_response("Book with flipped status"),
                            "404": error_response
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Unique identifier for the book" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string", "enum": genre_names },
                            "status": { "type": "string", "enum": status_names },
                            "coverImageUrl": { "type": "string", "format": "uri" },
                            "coverImage": {
                                "type": "string",
                                "format": "uri",
                                "description": "Cover image, or a placeholder seeded by the id"
                            }
                        },
                        "required": ["id", "title", "author", "genre", "status", "coverImage"]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string", "enum": genre_names },
                            "status": { "type": "string", "enum": status_names },
                            "coverImageUrl": { "type": "string", "format": "uri" }
                        },
                        "required": ["title", "author", "genre"]
                    },
                    "EditBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string", "enum": genre_names },
                            "status": { "type": "string", "enum": status_names },
                            "coverImageUrl": { "type": "string", "format": "uri" }
                        },
                        "required": ["title", "author", "genre"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let catalog = self.catalog.read().await;
        tracing::info!(
            module = self.name(),
            books = catalog.len(),
            persisted = catalog.is_persisted(),
            "books module stopped"
        );
        Ok(())
    }
}

/// Create a new instance of the books module over the shared catalog
pub fn create_module(catalog: SharedCatalog) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(catalog))
}
