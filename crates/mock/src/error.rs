//! Error types for the mock backend

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockError {
    #[error("Failed to bind mock server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MockResult<T> = Result<T, MockError>;
