//! Content errors

use thiserror::Error;

/// Errors raised while turning source files into module records
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("module {0} has no `id` in its front-matter")]
    MissingId(String),

    #[error("unknown division: {0}")]
    UnknownDivision(String),

    #[error("duplicate module id `{id}` in {first} and {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("invalid front-matter in {source_path}: {message}")]
    InvalidFrontMatter {
        source_path: String,
        message: String,
    },
}
