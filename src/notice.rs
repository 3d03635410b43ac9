use std::fmt;

use log::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message for the user. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn success<S: Into<String>>(text: S) -> Self {
        Notice { level: Level::Success, text: text.into() }
    }

    pub fn info<S: Into<String>>(text: S) -> Self {
        Notice { level: Level::Info, text: text.into() }
    }

    pub fn warning<S: Into<String>>(text: S) -> Self {
        Notice { level: Level::Warning, text: text.into() }
    }

    pub fn error<S: Into<String>>(text: S) -> Self {
        Notice { level: Level::Error, text: text.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// Print to the terminal, errors and warnings on stderr.
    pub fn show(&self) {
        debug!("Notice {:?}: {}", self.level, self.text);
        match self.level {
            Level::Success | Level::Info => println!("{}", self),
            Level::Warning | Level::Error => eprintln!("{}", self),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.text)
    }
}
