use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Wire model, field names follow the catalog API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: u16,
    pub status: BookStatus,
}

impl Book {
    pub fn fields(&self) -> BookFields {
        BookFields {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            published_year: self.published_year,
            status: self.status,
        }
    }
}

/// The five editable fields of a book, sent as the body of create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: u16,
    pub status: BookStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Issued,
}

impl BookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Issued => "Issued",
        }
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Available" => Ok(BookStatus::Available),
            "Issued" => Ok(BookStatus::Issued),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// One page of the book list as returned by `GET /books`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_page_from_api_payload() {
        let payload = json!({
            "books": [{
                "_id": "1",
                "title": "Dune",
                "author": "Herbert",
                "genre": "Sci-Fi",
                "publishedYear": 1965,
                "status": "Available"
            }],
            "total": 1
        });
        let page: BookPage = serde_json::from_value(payload).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.books[0].id, "1");
        assert_eq!(page.books[0].published_year, 1965);
        assert_eq!(page.books[0].status, BookStatus::Available);
    }

    #[test]
    fn fields_serialise_with_api_names() {
        let fields = BookFields {
            title: "Dune".into(),
            author: "Herbert".into(),
            genre: "Sci-Fi".into(),
            published_year: 1965,
            status: BookStatus::Issued,
        };
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({
                "title": "Dune",
                "author": "Herbert",
                "genre": "Sci-Fi",
                "publishedYear": 1965,
                "status": "Issued"
            })
        );
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("Issued".parse::<BookStatus>(), Ok(BookStatus::Issued));
        assert!("issued".parse::<BookStatus>().is_err());
    }
}
