use thiserror::Error;

use crate::system::SystemId;

/// Convenient result alias for the starroute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a system name could not be found in the catalog.
    #[error("unknown system name: {name}{}", format_suggestions(.suggestions))]
    UnknownSystem {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a system identifier could not be found in the catalog.
    #[error("unknown system id: {id}")]
    SystemNotFound { id: SystemId },

    /// Raised when the search frontier empties before reaching the goal.
    #[error("no route found between {start} and {goal}")]
    RouteNotFound { start: String, goal: String },

    /// Raised when ship data fails validation.
    #[error("invalid ship data: {message}")]
    ShipDataValidation { message: String },

    /// Raised when duplicate ship names are encountered during catalog load.
    #[error("duplicate ship name encountered: {name}")]
    DuplicateShipName { name: String },

    /// Raised when the run configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Raised when a catalog database lacks the expected table or columns.
    #[error("unsupported catalog schema: missing table '{table}' or one of its columns")]
    UnsupportedSchema { table: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON configuration errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
