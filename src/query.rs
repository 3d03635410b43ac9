use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::BookStatus;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const PAGE_SIZE_OPTIONS: [u32; 3] = [5, 10, 20];

// Matches what URLSearchParams leaves alone
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Parameters of a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub genre: Option<String>,
    pub status: Option<BookStatus>,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            genre: None,
            status: None,
            search: None,
        }
    }
}

impl ListQuery {
    /// Query string for `GET /books`, without the leading `?`.
    ///
    /// Empty filters are left out entirely rather than sent blank.
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = vec![
            ("page", self.page.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(genre) = non_empty(&self.genre) {
            pairs.push(("genre", genre.to_owned()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_owned()));
        }
        if let Some(search) = non_empty(&self.search) {
            pairs.push(("search", search.to_owned()));
        }
        pairs.iter()
            .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_valid_page_size(size: u32) -> bool {
    PAGE_SIZE_OPTIONS.contains(&size)
}

/// Parse a page size from the command line, only the offered choices pass.
pub fn parse_page_size(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(size) if is_valid_page_size(size) => Ok(size),
        _ => Err(format!(
            "page size must be one of {}",
            PAGE_SIZE_OPTIONS.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
        )),
    }
}
