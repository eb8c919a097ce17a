//! Error types for widget construction.
//!
//! Lookup failures are not errors: they travel as [`crate::lookup::LookupReply`] values and are
//! logged by the widget.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DropdownError {
    /// The lookup source is neither a candidate list nor a callable.
    #[error("Invalid lookup source: {0}")]
    InvalidLookupSource(String),

    /// A REST base URL could not be turned into an absolute URL.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DropdownError>;
