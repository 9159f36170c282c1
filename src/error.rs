use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error("invalid input: {0} (use letters only, or leave empty for the default list)")]
    InvalidInput(String),

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("not found: {url} returned status {status}")]
    NotFound { url: String, status: u16 },

    #[error("PokeAPI request failed: {0}")]
    Http(String),

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}
