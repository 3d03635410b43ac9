pub mod book;
pub mod user;

pub use book::{Book, BookFields, BookPage, BookStatus};
pub use user::{AuthResponse, Credentials, Registration, User};
