//! Typed error hierarchy for bug-point.
//!
//! Two enums cover the two failure domains:
//! - `StoreError`: per-request document store failures (recoverable,
//!   converted into an HTTP 500 by the API layer)
//! - `StartupError`: connect/ping/bind failures that terminate the process

use std::time::Duration;

use thiserror::Error;

/// Errors from a single document store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store backend error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("Malformed document in '{collection}': {reason}")]
    Malformed {
        collection: &'static str,
        reason: String,
    },
}

/// Fatal errors raised while bringing the service up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid connection string")]
    InvalidConnectionString(#[source] mongodb::error::Error),

    #[error("Failed to connect to document store")]
    Connect(#[source] mongodb::error::Error),

    #[error("Document store did not answer ping within {timeout:?}")]
    PingTimeout { timeout: Duration },

    #[error("Document store ping failed")]
    Ping(#[source] mongodb::error::Error),

    #[error("Failed to bind to {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error")]
    Serve(#[source] std::io::Error),
}
