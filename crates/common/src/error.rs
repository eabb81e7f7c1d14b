//! Unified error type for oddsboard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("The Odds API error (status={status}): {detail}")]
    OddsApi { status: u16, detail: String },

    #[error("ESPN scoreboard error (status={status}): {detail}")]
    Espn { status: u16, detail: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Upstream HTTP status, when this error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::OddsApi { status, .. } | Error::Espn { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures of an upstream call itself (non-2xx or transport),
    /// as opposed to decode or internal errors.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::OddsApi { .. } | Error::Espn { .. }
        )
    }
}

/// Truncate error detail to a bounded length, respecting char boundaries.
/// Upstream bodies can be arbitrarily large; clients only need the head.
pub fn truncate_detail(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
