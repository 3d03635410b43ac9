use log::*;
use thiserror::Error;
use validator::ValidateEmail;

use crate::api::{ApiClient, ApiError, Transport};
use crate::form::{FieldError, ValidationErrors};
use crate::model::{Credentials, Registration, User};
use crate::session::{Session, Storage};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AuthError::Invalid(errors) => errors.to_string(),
            AuthError::Api(e) => e.user_message(fallback),
            AuthError::Storage(e) => format!("{}: {:#}", fallback, e),
        }
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.trim().is_empty() {
        errors.push(FieldError { field: "email", message: "Please enter your email" });
    } else if !email.trim().validate_email() {
        errors.push(FieldError { field: "email", message: "Please enter a valid email" });
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError { field: "password", message: "Please enter your password" });
    }
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = vec![];
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        ValidationErrors::check(errors)
    }
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = vec![];
        if self.fullname.trim().is_empty() {
            errors.push(FieldError { field: "fullname", message: "Please enter your full name" });
        }
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        ValidationErrors::check(errors)
    }
}

/// Log in and keep the session. The client carries the new token from here on.
pub fn login<T, S>(api: &mut ApiClient<T>, session: &mut Session<S>, credentials: &Credentials) -> Result<User, AuthError>
    where T: Transport, S: Storage
{
    credentials.validate().map_err(AuthError::Invalid)?;
    let response = api.login(credentials)?;
    debug!("Login accepted for {}", credentials.email);
    let user = session.establish(response)?.clone();
    api.set_token(session.token().map(str::to_owned));
    Ok(user)
}

pub fn signup<T, S>(api: &mut ApiClient<T>, session: &mut Session<S>, registration: &Registration) -> Result<User, AuthError>
    where T: Transport, S: Storage
{
    registration.validate().map_err(AuthError::Invalid)?;
    let response = api.register(registration)?;
    debug!("Registration accepted for {}", registration.email);
    let user = session.establish(response)?.clone();
    api.set_token(session.token().map(str::to_owned));
    Ok(user)
}
