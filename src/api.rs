use log::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{AuthResponse, Book, BookFields, BookPage, Credentials, Registration};
use crate::query::ListQuery;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server responded with status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("request could not be completed: {0}")]
    Transport(String),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The server's `message` if it sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message: Some(m), .. } if !m.trim().is_empty() => m.clone(),
            _ => fallback.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the API base, starting with `/`
    pub path: String,
    pub body: Option<Value>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and hands back whatever came back, success or not.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn send(&self, request: Request) -> Result<Response, ApiError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        HttpTransport {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        debug!("{} {}", method, url);
        let mut builder = self.client.request(method, &url);
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!("{} -> {}", url, status);
        Ok(Response { status, body })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// REST client for the catalog API.
pub struct ApiClient<T> {
    transport: T,
    token: Option<String>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        ApiClient { transport, token: None }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn list_books(&self, query: &ListQuery) -> Result<BookPage, ApiError> {
        let path = format!("/books?{}", query.to_query_string());
        self.call(Method::Get, path, None)
    }

    pub fn create_book(&self, fields: &BookFields) -> Result<Book, ApiError> {
        self.call(Method::Post, "/books".to_owned(), Some(serde_json::to_value(fields)?))
    }

    pub fn update_book(&self, id: &str, fields: &BookFields) -> Result<Book, ApiError> {
        let path = format!("/books/{}", id);
        self.call(Method::Put, path, Some(serde_json::to_value(fields)?))
    }

    pub fn delete_book(&self, id: &str) -> Result<(), ApiError> {
        // Body is not required, ignore whatever came back
        self.send(Method::Delete, format!("/books/{}", id), None).map(|_| ())
    }

    pub fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.call(Method::Post, "/users/login".to_owned(), Some(serde_json::to_value(credentials)?))
    }

    pub fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.call(Method::Post, "/users/register".to_owned(), Some(serde_json::to_value(registration)?))
    }

    fn call<R: DeserializeOwned>(&self, method: Method, path: String, body: Option<Value>) -> Result<R, ApiError> {
        let response = self.send(method, path, body)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    fn send(&self, method: Method, path: String, body: Option<Value>) -> Result<Response, ApiError> {
        let response = self.transport.send(Request {
            method,
            path,
            body,
            token: self.token.clone(),
        })?;
        if !response.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response.body)
                .ok()
                .and_then(|b| b.message);
            warn!("Request failed with status {}: {:?}", response.status, message);
            return Err(ApiError::Status { status: response.status, message });
        }
        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::BookStatus;
    use serde_json::json;

    pub fn ok(body: Value) -> Result<Response, ApiError> {
        Ok(Response { status: 200, body: body.to_string() })
    }

    pub fn failed(status: u16, body: Value) -> Result<Response, ApiError> {
        Ok(Response { status, body: body.to_string() })
    }

    pub fn dune() -> Value {
        json!({
            "_id": "1",
            "title": "Dune",
            "author": "Herbert",
            "genre": "Sci-Fi",
            "publishedYear": 1965,
            "status": "Available"
        })
    }

    #[test]
    fn list_sends_query_and_token() {
        let mut transport = MockTransport::new();
        transport.expect_send()
            .withf(|r| r.method == Method::Get
                && r.path == "/books?page=1&limit=10"
                && r.token.as_deref() == Some("abc")
                && r.body.is_none())
            .times(1)
            .returning(|_| ok(json!({"books": [dune()], "total": 1})));
        let api = ApiClient::new(transport).with_token(Some("abc".into()));

        let page = api.list_books(&ListQuery::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.books[0].title, "Dune");
    }

    #[test]
    fn no_token_without_session() {
        let mut transport = MockTransport::new();
        transport.expect_send()
            .withf(|r| r.token.is_none())
            .returning(|_| ok(json!({"books": [], "total": 0})));
        let api = ApiClient::new(transport);
        assert!(api.list_books(&ListQuery::default()).is_ok());
    }

    #[test]
    fn update_puts_full_record() {
        let mut transport = MockTransport::new();
        transport.expect_send()
            .withf(|r| r.method == Method::Put
                && r.path == "/books/42"
                && r.body == Some(json!({
                    "title": "Dune",
                    "author": "Herbert",
                    "genre": "Sci-Fi",
                    "publishedYear": 1965,
                    "status": "Issued"
                })))
            .times(1)
            .returning(|_| ok(dune()));
        let api = ApiClient::new(transport);
        let fields = BookFields {
            title: "Dune".into(),
            author: "Herbert".into(),
            genre: "Sci-Fi".into(),
            published_year: 1965,
            status: BookStatus::Issued,
        };
        assert!(api.update_book("42", &fields).is_ok());
    }

    #[test]
    fn delete_tolerates_empty_body() {
        let mut transport = MockTransport::new();
        transport.expect_send()
            .withf(|r| r.method == Method::Delete && r.path == "/books/7")
            .times(1)
            .returning(|_| Ok(Response { status: 204, body: String::new() }));
        assert!(ApiClient::new(transport).delete_book("7").is_ok());
    }

    #[test]
    fn error_status_carries_server_message() {
        let mut transport = MockTransport::new();
        transport.expect_send()
            .returning(|_| failed(401, json!({"message": "Invalid credentials"})));
        let api = ApiClient::new(transport);
        let err = api.login(&Credentials { email: "a@b.c".into(), password: "x".into() })
            .unwrap_err();
        assert_eq!(err.user_message("Login failed"), "Invalid credentials");
    }

    #[test]
    fn error_without_message_uses_fallback() {
        let mut transport = MockTransport::new();
        transport.expect_send()
            .returning(|_| Ok(Response { status: 500, body: "<html>oops</html>".into() }));
        let err = ApiClient::new(transport).delete_book("1").unwrap_err();
        match &err {
            ApiError::Status { status, message } => {
                assert_eq!(*status, 500);
                assert!(message.is_none());
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.user_message("Failed to delete book"), "Failed to delete book");
    }

    #[test]
    fn transport_failure_uses_fallback() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(err.user_message("Failed to fetch books"), "Failed to fetch books");
    }
}
