use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that does not name a member of one of the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of genres a catalog record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Fantasy,
    Mystery,
    Biography,
    History,
    Other,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::ScienceFiction,
        Genre::Fantasy,
        Genre::Mystery,
        Genre::Biography,
        Genre::History,
        Genre::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Fantasy => "Fantasy",
            Genre::Mystery => "Mystery",
            Genre::Biography => "Biography",
            Genre::History => "History",
            Genre::Other => "Other",
        }
    }

    /// Map free text onto the enumeration, falling back to [`Genre::Other`].
    pub fn normalize(raw: &str) -> Genre {
        raw.parse().unwrap_or(Genre::Other)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive match against the display names.
impl FromStr for Genre {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownValue {
                kind: "genre",
                value: s.to_string(),
            })
    }
}

/// Checkout state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookStatus {
    #[default]
    Available,
    #[serde(rename = "Checked Out")]
    CheckedOut,
}

impl BookStatus {
    pub const ALL: [BookStatus; 2] = [BookStatus::Available, BookStatus::CheckedOut];

    pub const fn as_str(self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::CheckedOut => "Checked Out",
        }
    }

    pub const fn toggled(self) -> BookStatus {
        match self {
            BookStatus::Available => BookStatus::CheckedOut,
            BookStatus::CheckedOut => BookStatus::Available,
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownValue {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// A catalog record as stored and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque identifier assigned by the catalog
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub status: BookStatus,
    /// Cover image URI; see [`Book::cover_image`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
}

impl Book {
    /// Cover URI, or a placeholder image seeded by the id.
    pub fn cover_image(&self) -> String {
        match self.cover_image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => format!("https://picsum.photos/seed/{}/400/600", self.id),
        }
    }
}

/// A required text field left blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} must not be empty")]
pub struct ValidationError {
    pub field: &'static str,
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError { field })
    } else {
        Ok(())
    }
}

/// Fields for a new record; the catalog assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    /// Defaults to [`BookStatus::Available`]
    #[serde(default)]
    pub status: Option<BookStatus>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, genre: Genre) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre,
            status: None,
            cover_image_url: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("author", &self.author)
    }

    pub(crate) fn into_book(self, id: String) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            status: self.status.unwrap_or_default(),
            cover_image_url: self.cover_image_url,
        }
    }
}

/// Edit-form payload for an existing record.
///
/// Omitted status and cover keep the record's current values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBook {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    #[serde(default)]
    pub status: Option<BookStatus>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl EditBook {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("author", &self.author)
    }

    /// Produce the replacement record, keeping the original id.
    pub fn apply_to(self, existing: &Book) -> Book {
        Book {
            id: existing.id.clone(),
            title: self.title,
            author: self.author,
            genre: self.genre,
            status: self.status.unwrap_or(existing.status),
            cover_image_url: self
                .cover_image_url
                .or_else(|| existing.cover_image_url.clone()),
        }
    }
}
