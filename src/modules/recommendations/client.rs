//! Single-shot book suggestions from a generative-text model.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::books::models::{BookStatus, Genre, NewBook};

/// Message shown to users for any upstream failure; the cause is only logged.
pub const RETRY_MESSAGE: &str = "Failed to get a recommendation from the AI. Please try again.";

/// Message shown when the prompt is blank.
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a description of the book you want.";

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful librarian. Provide a single book recommendation with a title, author, and a specific genre from this list: Fiction, Non-Fiction, Science Fiction, Fantasy, Mystery, Biography, History, Other. Respond only with a JSON object.";

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("recommendation prompt is empty")]
    EmptyPrompt,

    #[error("malformed recommendation response: {0}")]
    MalformedResponse(String),

    #[error("recommendation service error: {0}")]
    ServiceError(String),
}

impl RecommendationError {
    /// Text safe to show to the person who asked.
    pub fn user_message(&self) -> &'static str {
        match self {
            RecommendationError::EmptyPrompt => EMPTY_PROMPT_MESSAGE,
            RecommendationError::MalformedResponse(_) | RecommendationError::ServiceError(_) => {
                RETRY_MESSAGE
            }
        }
    }
}

/// One structured-output generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// JSON schema (in the service's OpenAPI subset) the answer must honor
    pub response_schema: serde_json::Value,
}

/// A generative-text backend returning the raw text of its answer.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, RecommendationError>;
}

/// A suggestion whose genre has been mapped onto the closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub author: String,
    pub genre: Genre,
}

/// Suggestion as submitted for acceptance; the genre may still be free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionDraft {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: String,
}

impl SuggestionDraft {
    /// Catalog draft for an accepted suggestion.
    pub fn into_new_book(self) -> NewBook {
        NewBook {
            status: Some(BookStatus::Available),
            ..NewBook::new(self.title, self.author, Genre::normalize(&self.genre))
        }
    }
}

impl From<Suggestion> for SuggestionDraft {
    fn from(suggestion: Suggestion) -> Self {
        Self {
            title: suggestion.title,
            author: suggestion.author,
            genre: suggestion.genre.as_str().to_string(),
        }
    }
}

/// Schema sent with every request: an object with required string fields.
pub fn suggestion_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "The title of the recommended book."
            },
            "author": {
                "type": "STRING",
                "description": "The author of the recommended book."
            },
            "genre": {
                "type": "STRING",
                "description": "The genre of the recommended book from the provided list."
            }
        },
        "required": ["title", "author", "genre"]
    })
}

pub fn build_request(prompt: &str) -> GenerateRequest {
    GenerateRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        prompt: format!(
            "Based on the following prompt, recommend a single book. Prompt: \"{}\"",
            prompt.trim()
        ),
        response_schema: suggestion_schema(),
    }
}

#[derive(Deserialize)]
struct RawSuggestion {
    title: String,
    author: String,
    genre: String,
}

/// Strip an optional Markdown code fence around the JSON body.
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Info string such as `json` or `JSON`
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model's raw answer into a [`Suggestion`].
pub fn parse_suggestion(text: &str) -> Result<Suggestion, RecommendationError> {
    let raw: RawSuggestion = serde_json::from_str(unfence(text))
        .map_err(|err| RecommendationError::MalformedResponse(err.to_string()))?;

    if raw.title.trim().is_empty() {
        return Err(RecommendationError::MalformedResponse(
            "title is empty".to_string(),
        ));
    }
    if raw.author.trim().is_empty() {
        return Err(RecommendationError::MalformedResponse(
            "author is empty".to_string(),
        ));
    }

    Ok(Suggestion {
        title: raw.title.trim().to_string(),
        author: raw.author.trim().to_string(),
        genre: Genre::normalize(&raw.genre),
    })
}

/// Turns a free-text prompt into one validated suggestion.
#[derive(Clone)]
pub struct Recommender {
    model: Arc<dyn GenerativeModel>,
}

impl Recommender {
    pub fn new(model: impl GenerativeModel + 'static) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    pub fn from_shared(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn recommend(&self, prompt: &str) -> Result<Suggestion, RecommendationError> {
        if prompt.trim().is_empty() {
            return Err(RecommendationError::EmptyPrompt);
        }

        let request = build_request(prompt);
        let text = self.model.generate(&request).await?;
        let suggestion = parse_suggestion(&text)?;

        tracing::debug!(
            title = %suggestion.title,
            genre = %suggestion.genre,
            "recommendation parsed"
        );
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a canned answer and records the requests it saw.
    struct CannedModel {
        answer: Result<String, String>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl CannedModel {
        fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                answer: Err(reason.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for CannedModel {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, RecommendationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.answer
                .clone()
                .map_err(RecommendationError::ServiceError)
        }
    }

    #[tokio::test]
    async fn free_text_genre_falls_back_to_other() {
        let recommender = Recommender::new(CannedModel::answering(
            r#"{"title":"X","author":"Y","genre":"Thriller"}"#,
        ));
        let suggestion = recommender.recommend("something tense").await.unwrap();
        assert_eq!(suggestion.genre, Genre::Other);
    }

    #[tokio::test]
    async fn known_genre_matches_case_insensitively() {
        let recommender = Recommender::new(CannedModel::answering(
            r#"{"title":"The Name of the Rose","author":"Umberto Eco","genre":"mystery"}"#,
        ));
        let suggestion = recommender.recommend("monks").await.unwrap();
        assert_eq!(
            suggestion,
            Suggestion {
                title: "The Name of the Rose".to_string(),
                author: "Umberto Eco".to_string(),
                genre: Genre::Mystery,
            }
        );
    }

    #[tokio::test]
    async fn request_carries_prompt_and_schema() {
        let model = Arc::new(CannedModel::answering(
            r#"{"title":"Dune","author":"Frank Herbert","genre":"Science Fiction"}"#,
        ));
        let recommender = Recommender::from_shared(model.clone());
        recommender.recommend("  desert planets  ").await.unwrap();

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].prompt,
            "Based on the following prompt, recommend a single book. Prompt: \"desert planets\""
        );
        assert_eq!(seen[0].system_instruction, SYSTEM_INSTRUCTION);
        assert_eq!(
            seen[0].response_schema["required"],
            serde_json::json!(["title", "author", "genre"])
        );
    }

    #[tokio::test]
    async fn blank_prompt_never_reaches_the_model() {
        let model = Arc::new(CannedModel::answering("{}"));
        let recommender = Recommender::from_shared(model.clone());
        let err = recommender.recommend("   ").await.unwrap_err();
        assert!(matches!(err, RecommendationError::EmptyPrompt));
        assert_eq!(err.user_message(), EMPTY_PROMPT_MESSAGE);
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_failures_surface_generic_message() {
        let recommender = Recommender::new(CannedModel::failing("connection reset"));
        let err = recommender.recommend("anything").await.unwrap_err();
        assert!(matches!(err, RecommendationError::ServiceError(_)));
        assert_eq!(err.user_message(), RETRY_MESSAGE);
    }

    #[test]
    fn unparseable_text_is_malformed() {
        let err = parse_suggestion("I recommend Dune!").unwrap_err();
        assert!(matches!(err, RecommendationError::MalformedResponse(_)));
        assert_eq!(err.user_message(), RETRY_MESSAGE);
    }

    #[test]
    fn missing_or_mistyped_fields_are_malformed() {
        for text in [
            r#"{"title":"Dune","author":"Frank Herbert"}"#,
            r#"{"title":"Dune","genre":"Fiction"}"#,
            r#"{"title":42,"author":"Frank Herbert","genre":"Fiction"}"#,
            r#"{"title":"  ","author":"Frank Herbert","genre":"Fiction"}"#,
            r#"[]"#,
        ] {
            assert!(
                matches!(
                    parse_suggestion(text),
                    Err(RecommendationError::MalformedResponse(_))
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn empty_genre_is_other() {
        let suggestion =
            parse_suggestion(r#"{"title":"Dune","author":"Frank Herbert","genre":""}"#).unwrap();
        assert_eq!(suggestion.genre, Genre::Other);
    }

    #[test]
    fn fenced_json_is_accepted() {
        let text = "```json\n{\"title\":\"Dune\",\"author\":\"Frank Herbert\",\"genre\":\"Science Fiction\"}\n```";
        let suggestion = parse_suggestion(text).unwrap();
        assert_eq!(suggestion.genre, Genre::ScienceFiction);
    }

    #[test]
    fn fence_tag_is_stripped_regardless_of_case() {
        for tag in ["JSON", "Json", ""] {
            let text = format!(
                "```{tag}\n{{\"title\":\"Emma\",\"author\":\"Jane Austen\",\"genre\":\"fiction\"}}\n```"
            );
            let suggestion = parse_suggestion(&text).unwrap();
            assert_eq!(suggestion.title, "Emma");
            assert_eq!(suggestion.genre, Genre::Fiction);
        }
    }

    #[test]
    fn accepted_draft_normalizes_genre_and_status() {
        let draft = SuggestionDraft {
            title: "Neuromancer".to_string(),
            author: "William Gibson".to_string(),
            genre: "sci-fi".to_string(),
        };
        let new_book = draft.into_new_book();
        assert_eq!(new_book.genre, Genre::Other);
        assert_eq!(new_book.status, Some(BookStatus::Available));
    }
}
