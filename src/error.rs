// Error taxonomy shared by the catalog and generation clients
//
// No variant is ever retried internally: auth and protocol problems are
// fatal to the current operation, and the per-album fan-out downgrades a
// failing album to an empty track list instead of surfacing here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Credentials or API key are missing or were rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure (DNS, connect, timeout, broken body).
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered, but not in the shape we expect.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The model reply contained no usable id array.
    #[error("parse error: {0}")]
    Parse(String),

    /// The generation endpoint returned a non-success status.
    /// The upstream error body is carried along verbatim.
    #[error("generation endpoint error {status}: {body}")]
    Upstream { status: u16, body: String },
}
