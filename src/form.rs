use std::fmt;

use itertools::Itertools;
use log::*;
use thiserror::Error;

use crate::api::{ApiClient, Transport};
use crate::model::{Book, BookFields, BookStatus};
use crate::notice::Notice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every field that failed, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub(crate) fn check(errors: Vec<FieldError>) -> Result<(), ValidationErrors> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|e| format!("{}: {}", e.field, e.message)).join("\n"))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Error)]
pub enum FormError {
    /// Caught before anything was sent
    #[error("{0}")]
    Invalid(ValidationErrors),
    /// The server refused, the form stays open with its values
    #[error("{0}")]
    Rejected(String),
}

/// Raw values of the create/edit form as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: String,
    pub status: String,
}

impl Default for BookForm {
    fn default() -> Self {
        BookForm {
            title: String::new(),
            author: String::new(),
            genre: String::new(),
            published_year: String::new(),
            status: BookStatus::default().to_string(),
        }
    }
}

/// Fields the user chose to change on an existing book.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub published_year: Option<String>,
    pub status: Option<String>,
}

impl BookForm {
    /// Prefilled from an existing record, for editing.
    pub fn from_book(book: &Book) -> Self {
        BookForm {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            published_year: book.published_year.to_string(),
            status: book.status.to_string(),
        }
    }

    pub fn apply(mut self, changes: BookChanges) -> Self {
        if let Some(v) = changes.title { self.title = v; }
        if let Some(v) = changes.author { self.author = v; }
        if let Some(v) = changes.genre { self.genre = v; }
        if let Some(v) = changes.published_year { self.published_year = v; }
        if let Some(v) = changes.status { self.status = v; }
        self
    }

    pub fn validate(&self) -> Result<BookFields, ValidationErrors> {
        let mut errors = vec![];
        let mut required = |field, value: &str, message| {
            if value.trim().is_empty() {
                errors.push(FieldError { field, message });
            }
        };
        required("title", &self.title, "Please enter the book title");
        required("author", &self.author, "Please enter the author's name");
        required("genre", &self.genre, "Please enter the genre");

        let year = self.published_year.trim();
        if year.is_empty() {
            errors.push(FieldError { field: "publishedYear", message: "Please enter published year" });
        } else if !is_four_digit_year(year) {
            errors.push(FieldError { field: "publishedYear", message: "Please enter a valid year (e.g., 2023)" });
        }

        let status = self.status.trim();
        let parsed_status = status.parse::<BookStatus>();
        if status.is_empty() {
            errors.push(FieldError { field: "status", message: "Please select status" });
        } else if parsed_status.is_err() {
            errors.push(FieldError { field: "status", message: "Status must be Available or Issued" });
        }
        ValidationErrors::check(errors)?;

        Ok(BookFields {
            title: self.title.trim().to_owned(),
            author: self.author.trim().to_owned(),
            genre: self.genre.trim().to_owned(),
            // Four ascii digits always fit
            published_year: year.parse().unwrap_or_default(),
            status: parsed_status.unwrap_or_default(),
        })
    }
}

// Pattern only, 0042 is accepted
fn is_four_digit_year(year: &str) -> bool {
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}

/// Submit the create form. `on_saved` runs only after the server accepted it.
pub fn create<T, F>(api: &ApiClient<T>, form: &BookForm, on_saved: F) -> Result<Notice, FormError>
    where T: Transport, F: FnOnce(&Book)
{
    let fields = form.validate().map_err(FormError::Invalid)?;
    match api.create_book(&fields) {
        Ok(book) => {
            info!("Created book {} ({})", book.title, book.id);
            on_saved(&book);
            Ok(Notice::success("Book added successfully!"))
        }
        Err(e) => {
            warn!("Create failed: {}", e);
            Err(FormError::Rejected(e.user_message("Failed to add book. Please check all fields.")))
        }
    }
}

/// Submit the edit form as a full replace of the editable fields.
pub fn update<T, F>(api: &ApiClient<T>, id: &str, form: &BookForm, on_saved: F) -> Result<Notice, FormError>
    where T: Transport, F: FnOnce(&Book)
{
    let fields = form.validate().map_err(FormError::Invalid)?;
    match api.update_book(id, &fields) {
        Ok(book) => {
            info!("Updated book {}", id);
            on_saved(&book);
            Ok(Notice::success("Book has been updated successfully!"))
        }
        Err(e) => {
            warn!("Update of {} failed: {}", id, e);
            Err(FormError::Rejected(e.user_message("Failed to update book")))
        }
    }
}
