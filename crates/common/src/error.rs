//! Error types for the JWT Pizza domain

use thiserror::Error;

/// Result type alias using the domain Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No fixture identity with email {0}")]
    UnknownIdentity(String),
}
