pub mod api;
pub mod auth;
pub mod form;
pub mod list;
pub mod model;
pub mod notice;
pub mod prompt;
pub mod query;
pub mod session;
pub mod table;

pub use api::{ApiClient, ApiError, HttpTransport, Transport};
pub use auth::{login, signup, AuthError};
pub use form::{BookChanges, BookForm, FormError, ValidationErrors};
pub use list::{delete_book, BookList, DeleteOutcome};
pub use notice::Notice;
pub use query::ListQuery;
pub use session::{FileStorage, Session, Storage};
