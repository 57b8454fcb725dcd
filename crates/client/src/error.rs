use thiserror::Error;

/// Error type for zkbridge client operations.
///
/// Every variant is a transport-level failure: the verifier either could not be reached or
/// answered with something that is not a classifiable submission result. Retrying is left to
/// the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed or URL conversion failed.
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Joining an endpoint path onto the base URL failed.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    /// Server returned an error response that carries no submission result.
    #[error("Requested {url} failed with status {status} and msg {}", msg.as_deref().unwrap_or("Unknown"))]
    ErrorStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error message from the server response body, if available.
        msg: Option<String>,
    },
}
