//! Statement batch splitting on a separator line.
//!
//! Many drivers execute one statement group per call and do not understand
//! client-side separators such as `GO`. A script is split on lines that hold
//! only the separator token; the match is textual, so a separator line inside
//! a string literal or block comment still splits.

use crate::error::{CoreError, CoreResult};

/// Default batch separator token
pub const DEFAULT_SEPARATOR: &str = "GO";

/// Splits script text into independently executable batches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSplitter {
    separator: String,
}

impl Default for BatchSplitter {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl BatchSplitter {
    /// Create a splitter for `separator` (matched case-insensitively).
    pub fn new(separator: impl Into<String>) -> CoreResult<Self> {
        let separator = separator.into();
        if separator.is_empty() || separator.chars().any(char::is_whitespace) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "batch separator must be a single non-empty token, got '{separator}'"
                ),
            });
        }
        Ok(Self { separator })
    }

    /// The separator token
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Split `sql` into trimmed, non-empty batches in source order.
    pub fn split(&self, sql: &str) -> Vec<String> {
        let sql = sql.strip_prefix('\u{feff}').unwrap_or(sql);
        let mut batches = Vec::new();
        let mut current = String::new();

        for line in sql.lines() {
            if line.trim().eq_ignore_ascii_case(&self.separator) {
                push_batch(&mut batches, &current);
                current.clear();
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        push_batch(&mut batches, &current);

        batches
    }
}

fn push_batch(batches: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
