pub mod client;
pub mod gemini;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Module};

use crate::modules::books::catalog::SharedCatalog;
use client::Recommender;
use routes::RecommendationsState;

/// AI-assisted book suggestions that feed accepted results into the catalog
pub struct RecommendationsModule {
    state: RecommendationsState,
}

impl RecommendationsModule {
    pub fn new(recommender: Recommender, catalog: SharedCatalog) -> Self {
        Self {
            state: RecommendationsState::new(recommender, catalog),
        }
    }
}

#[async_trait]
impl Module for RecommendationsModule {
    fn name(&self) -> &'static str {
        "recommendations"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            model = %ctx.settings.recommendation.model,
            timeout_ms = ctx.settings.recommendation.timeout_ms,
            "recommendations module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Ask for a single book suggestion",
                        "tags": ["Recommendations"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/RecommendRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Suggestion with a normalized genre",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Suggestion" }
                                    }
                                }
                            },
                            "409": error_response("Another request is in progress"),
                            "422": error_response("Prompt is empty"),
                            "502": error_response("The service failed or answered with malformed content")
                        }
                    }
                },
                "/accept": {
                    "post": {
                        "summary": "Add a suggestion to the catalog",
                        "tags": ["Recommendations"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Suggestion" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "422": error_response("Title or author is empty")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Recommendations health check",
                        "tags": ["Recommendations"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RecommendRequest": {
                        "type": "object",
                        "properties": {
                            "prompt": {
                                "type": "string",
                                "description": "Description of the book wanted"
                            }
                        },
                        "required": ["prompt"]
                    },
                    "Suggestion": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string" }
                        },
                        "required": ["title", "author", "genre"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        if self.state.is_busy() {
            tracing::warn!(module = self.name(), "abandoning in-flight recommendation");
        }
        tracing::info!(module = self.name(), "recommendations module stopped");
        Ok(())
    }
}

/// Create a new instance of the recommendations module
pub fn create_module(recommender: Recommender, catalog: SharedCatalog) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(RecommendationsModule::new(recommender, catalog))
}
