//! Error types for the summary pipeline.
//!
//! Stage-local failures (decomposition, subquery execution) are absorbed
//! and turned into data. Only [`PipelineError`] ever reaches the caller.

use thiserror::Error;

/// Errors raised by a language oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The request did not complete within the client timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The oracle endpoint could not be reached.
    #[error("Cannot connect to oracle at {0}")]
    Connect(String),

    /// Transport-level failure.
    #[error("Failed to send request: {0}")]
    Request(String),

    /// The oracle answered with a non-success status.
    #[error("Oracle API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Failed to parse oracle response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by a scoped data-access tool.
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// The data source could not be reached or the request failed.
    #[error("Data source request failed: {0}")]
    Request(String),

    /// The data source rejected the subquery.
    #[error("Data source error {status}: {body}")]
    Api { status: u16, body: String },
}

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The synthesis oracle failed; no narrative can be produced.
    #[error("Synthesis failed: {0}")]
    Synthesis(#[source] OracleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_error_message() {
        let err = PipelineError::Synthesis(OracleError::Api {
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.to_string(), "Synthesis failed: Oracle API error 500: boom");
    }
}
