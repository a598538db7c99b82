//! Fatal settings load errors.
//!
//! Anything listed here aborts construction of a settings graph; the caller
//! falls back to an empty settings instance and shows the error. Problems a
//! load can recover from are [`crate::SettingsLoadWarning`]s instead.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Matches a JSON object key followed by its colon.
static OBJECT_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""((?:[^"\\]|\\.)*)"\s*:"#)
        .expect("object key regex is a compile-time constant and must be valid")
});

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Merging every source produced no profiles at all.
    #[error("No profiles were found in the settings")]
    NoProfiles,

    /// Every profile is hidden, so there is nothing to launch.
    #[error("All profiles are hidden")]
    AllProfilesHidden,

    /// The text is not well-formed JSON.
    #[error("Invalid JSON at line {line}, column {column}: {message}")]
    InvalidJson {
        line: usize,
        column: usize,
        message: String,
    },

    /// Well-formed JSON with a value of the wrong shape.
    #[error("{0}")]
    Deserialization(DeserializationReport),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SettingsError {
    /// Classify a `serde_json` error raised while parsing `text`.
    pub fn from_json_error(err: serde_json::Error, text: &str) -> Self {
        let (line, column) = (err.line(), err.column());
        let full = err.to_string();
        let message = full
            .strip_suffix(&format!(" at line {line} column {column}"))
            .unwrap_or(&full)
            .to_string();

        match err.classify() {
            serde_json::error::Category::Io => {
                Self::Io(std::io::Error::other(message))
            }
            serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
                Self::InvalidJson {
                    line,
                    column,
                    message,
                }
            }
            serde_json::error::Category::Data => {
                let (have, expected) = split_have_expected(&message);
                Self::Deserialization(DeserializationReport {
                    line,
                    column,
                    key: key_before(text, line, column),
                    have,
                    expected,
                    message,
                })
            }
        }
    }

    /// The typed report for deserialization errors.
    pub fn deserialization_report(&self) -> Option<&DeserializationReport> {
        match self {
            Self::Deserialization(report) => Some(report),
            _ => None,
        }
    }
}

/// Location and type mismatch details for a value that failed to deserialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializationReport {
    pub line: usize,
    pub column: usize,
    /// Closest object key preceding the error position.
    pub key: Option<String>,
    /// What was found, e.g. `string "abc"`.
    pub have: Option<String>,
    /// What the settings model wanted, e.g. `u32`.
    pub expected: Option<String>,
    pub message: String,
}

impl fmt::Display for DeserializationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* Line {}, Column {}", self.line, self.column)?;
        if let Some(key) = &self.key {
            write!(f, " ({key})")?;
        }
        match (&self.have, &self.expected) {
            (Some(have), Some(expected)) => {
                write!(f, "\n  Have: {have}\n  Expected: {expected}")
            }
            _ => write!(f, "\n  {}", self.message),
        }
    }
}

fn split_have_expected(message: &str) -> (Option<String>, Option<String>) {
    let Some((have, expected)) = message.split_once(", expected ") else {
        return (None, None);
    };
    let have = have
        .strip_prefix("invalid type: ")
        .or_else(|| have.strip_prefix("invalid value: "))
        .or_else(|| have.strip_prefix("unknown variant "))
        .unwrap_or(have);
    (Some(have.to_string()), Some(expected.to_string()))
}

/// Last object key that appears before `line`/`column` (both 1-based) in `text`.
fn key_before(text: &str, line: usize, column: usize) -> Option<String> {
    if line == 0 {
        return None;
    }
    let mut offset = 0usize;
    for (index, content) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            offset += column.min(content.len());
            break;
        }
        offset += content.len();
    }
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }

    OBJECT_KEY_PATTERN
        .captures_iter(&text[..offset])
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
