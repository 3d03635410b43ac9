use std::io::{self, BufRead, Write};
use log::warn;

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Interactive yes/no on the terminal. Anything but y/yes is a no.
pub struct Terminal;

impl Confirm for Terminal {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = read_line(&format!("{} [y/N] ", question))?;
        Ok(match answer {
            Some(a) => matches!(a.to_ascii_lowercase().as_str(), "y" | "yes"),
            None => false,
        })
    }
}

/// For `--yes`, confirmation was given up front.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Prompt on stdout and read one trimmed line. `None` on end of input.
pub fn read_line(prompt: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        warn!("Prompt '{}' cancelled, no input", prompt.trim());
        return Ok(None)
    }
    Ok(Some(line.trim().to_owned()))
}
