use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document description could not be parsed.
    #[error("invalid paper description: {0}")]
    Json(#[from] serde_json::Error),

    /// The decorative asset could not be read or decoded.
    #[error("decorative image unavailable: {0}")]
    Asset(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("render error: {0}")]
    Render(String),
}
