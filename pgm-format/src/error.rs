use std::io;

#[cfg(doc)]
use crate::decode;

/// The errors that can be encountered by [`decode`].
#[derive(Debug, thiserror::Error)]
pub enum PgmError {
    #[error("failed to read from source: {0}")]
    Io(#[from] io::Error),

    #[error("expected the format tag '{expected}', got '{found}'")]
    InvalidFormatTag {
        expected: &'static str,
        found: String,
    },

    #[error("'{token}' is not a valid {field}")]
    InvalidNumber { field: &'static str, token: String },

    #[error("the header is incomplete, the {0} is missing")]
    IncompleteHeader(&'static str),

    #[error("the maximal value {max_value} exceeds the supported limit {limit}")]
    MaxValueTooLarge { max_value: u32, limit: u32 },

    #[error("an image of {width}x{height} pixels cannot be stored")]
    DimensionsTooLarge { width: usize, height: usize },

    #[error("value {value} at position {position} exceeds the maximal value {max_value}")]
    ValueTooLarge {
        value: u32,
        position: usize,
        max_value: u32,
    },

    #[error("expected {expected} values, but parsed {parsed}")]
    TooFewValues { expected: usize, parsed: usize },

    #[error("unexpected '{0}' after the last value")]
    TrailingData(String),
}
