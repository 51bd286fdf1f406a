//! Terminal input and output helpers.

use std::io::{self, Write};

use anyhow::Result;
use movierank_core::Notifier;

/// Prints notifications as `Title: message` lines
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str) {
        println!("{}: {}", title, message);
    }
}

/// Read one trimmed line; `None` at end of input
pub fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Prompt for a value, offering `default` when the answer is empty
pub fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    let text = match default {
        Some(d) if !d.is_empty() => format!("{} [{}]: ", label, d),
        _ => format!("{}: ", label),
    };
    let answer = read_line(&text)?.unwrap_or_default();
    if answer.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(answer)
    }
}

pub fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}
