use std::path::PathBuf;

use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

use crate::search_form::FieldKind;

// Errors raised while building forms, parsing parameters and writing scaffolding
#[derive(Debug, Error)]
pub enum FilterError {
    // Reading a field the form was never told about
    #[error("undefined property `{0}` on search form")]
    NoSuchProperty(String),

    // Typed accessor used on a field of the other kind
    #[error("field `{name}` is {actual:?}, not {expected:?}")]
    WrongKind {
        name: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    // Malformed parameter keys or field specs
    #[error("parse error: {0}")]
    Parse(String),

    // Invalid configuration values
    #[error("config error: {0}")]
    Config(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FilterError::Io {
            path: path.into(),
            source,
        }
    }
}

// Type alias for results that use `FilterError` as the error type
pub type Result<T> = std::result::Result<T, FilterError>;
