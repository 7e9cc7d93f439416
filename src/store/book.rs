// Book record types
// The stored record, the payload accepted by create, and the partial payload accepted by update

use serde::{Deserialize, Serialize};

/// Store-assigned book identifier
pub type BookId = String;

/// A catalog entry as stored and served
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    pub description: String,
    pub published_year: i32,
}

/// Fields required to create a book (everything but the id)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub description: String,
    pub published_year: i32,
}

/// Partial update; `None` leaves the stored field untouched
///
/// Unknown keys (including `id` and `_id`) are ignored, so the identifier
/// can never be rewritten through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
}

impl Book {
    /// Build a record from creation fields and a freshly assigned id
    pub fn from_new(id: BookId, new: NewBook) -> Self {
        Self {
            id,
            title: new.title,
            author: new.author,
            genre: new.genre,
            cover_image_url: new.cover_image_url,
            description: new.description,
            published_year: new.published_year,
        }
    }

    /// Overlay every supplied field of `patch` onto this record
    pub fn apply(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(url) = patch.cover_image_url {
            self.cover_image_url = Some(url);
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(year) = patch.published_year {
            self.published_year = year;
        }
    }
}

impl BookPatch {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.cover_image_url.is_none()
            && self.description.is_none()
            && self.published_year.is_none()
    }
}

/// Records every fresh process starts with
pub fn seed_books() -> Vec<Book> {
    vec![
        Book {
            id: "1".to_string(),
            title: "hasaan here".to_string(),
            author: "hasaan".to_string(),
            genre: "Fiction".to_string(),
            cover_image_url: Some(String::new()),
            description: "A great book about adventures.".to_string(),
            published_year: 2023,
        },
        Book {
            id: "2".to_string(),
            title: "Test book".to_string(),
            author: "Hassan".to_string(),
            genre: "Non-fiction".to_string(),
            cover_image_url: Some(String::new()),
            description: "An informative book.".to_string(),
            published_year: 2024,
        },
    ]
}
