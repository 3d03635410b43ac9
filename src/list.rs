use std::io;

use itertools::Itertools;
use log::*;

use crate::api::{ApiClient, ApiError, Transport};
use crate::model::{Book, BookPage, BookStatus};
use crate::notice::Notice;
use crate::prompt::Confirm;
use crate::query::{is_valid_page_size, ListQuery, PAGE_SIZE_OPTIONS};

/// Identifies one page fetch. Only the most recently issued ticket may
/// update the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    pub query: ListQuery,
}

/// The book list view: current filters and paging, plus the last page that
/// was fetched successfully.
#[derive(Debug, Default)]
pub struct BookList {
    query: ListQuery,
    books: Vec<Book>,
    total: u64,
    loading: bool,
    generation: u64,
}

impl BookList {
    pub fn new(query: ListQuery) -> Self {
        BookList { query, ..BookList::default() }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn find(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Genre filter choices, taken from the books currently shown.
    pub fn genres(&self) -> Vec<&str> {
        self.books.iter().map(|b| b.genre.as_str()).unique().collect()
    }

    // Every filter change starts over from the first page
    pub fn set_genre(&mut self, genre: Option<String>) {
        self.query.genre = genre.filter(|g| !g.trim().is_empty());
        self.query.page = 1;
    }

    pub fn set_status(&mut self, status: Option<BookStatus>) {
        self.query.status = status;
        self.query.page = 1;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.query.search = search.filter(|s| !s.trim().is_empty());
        self.query.page = 1;
    }

    /// Sizes outside the offered choices are ignored and leave the query
    /// as it was. Returns whether the size was taken.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if !is_valid_page_size(page_size) {
            warn!("Ignoring page size {}, allowed are {:?}", page_size, PAGE_SIZE_OPTIONS);
            return false
        }
        self.query.page_size = page_size;
        self.query.page = 1;
        true
    }

    pub fn set_page(&mut self, page: u32) {
        self.query.page = page.max(1);
    }

    /// Start a fetch for the current query. Any ticket issued earlier is
    /// superseded from here on.
    pub fn begin_fetch(&mut self) -> Ticket {
        self.generation += 1;
        self.loading = true;
        debug!("Fetch #{} for {:?}", self.generation, self.query);
        Ticket { generation: self.generation, query: self.query.clone() }
    }

    /// Apply the outcome of a fetch. Superseded tickets are dropped without
    /// touching the list and yield no notice.
    pub fn complete(&mut self, ticket: Ticket, result: Result<BookPage, ApiError>) -> Option<Notice> {
        if ticket.generation != self.generation {
            debug!("Discarding response to fetch #{}, latest is #{}", ticket.generation, self.generation);
            return None
        }
        self.loading = false;
        match result {
            Ok(page) => {
                debug!("Fetched {} of {} books", page.books.len(), page.total);
                self.books = page.books;
                self.total = page.total;
                if self.books.is_empty() {
                    Some(Notice::info("No books found with current filters or search."))
                } else {
                    None
                }
            }
            Err(e) => {
                warn!("Fetching books failed: {}", e);
                self.books.clear();
                self.total = 0;
                Some(Notice::error(e.user_message("Failed to fetch books")))
            }
        }
    }

    pub fn refresh<T: Transport>(&mut self, api: &ApiClient<T>) -> Option<Notice> {
        let ticket = self.begin_fetch();
        let result = api.list_books(&ticket.query);
        self.complete(ticket, result)
    }

    pub fn page_count(&self) -> u64 {
        let size = u64::from(self.query.page_size.max(1));
        self.total.div_ceil(size).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user said no, nothing was sent
    Cancelled,
    /// Deleted, with the notices to show (the refresh may add one)
    Deleted(Vec<Notice>),
    /// Server refused, list left as it was
    Failed(Notice),
}

/// Delete a book after the user confirms, then refresh the current page.
pub fn delete_book<T, C>(api: &ApiClient<T>, list: &mut BookList, confirm: &mut C, id: &str, title: &str) -> io::Result<DeleteOutcome>
    where T: Transport, C: Confirm + ?Sized
{
    if !confirm.confirm(&format!("Are you sure you want to delete \"{}\"?", title))? {
        info!("Delete of {} cancelled", id);
        return Ok(DeleteOutcome::Cancelled)
    }
    match api.delete_book(id) {
        Ok(()) => {
            let mut notices = vec![Notice::success(format!("Book \"{}\" deleted successfully", title))];
            notices.extend(list.refresh(api));
            Ok(DeleteOutcome::Deleted(notices))
        }
        Err(e) => {
            warn!("Delete of {} failed: {}", id, e);
            Ok(DeleteOutcome::Failed(Notice::error(e.user_message("Failed to delete book"))))
        }
    }
}
