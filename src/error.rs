//! Error types for spamwatch.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Object-store read errors. These are fatal to the invocation; there is
/// no retry.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("Fetch of {bucket}/{key} failed: {reason}")]
    FetchFailed {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Inbound parsing and outbound reply errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to parse message: {0}")]
    Parse(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build reply: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Send(String),
}

/// Inference endpoint errors. The call is fatal on failure; the caller
/// sees an unhandled error, never a partial verdict.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Endpoint {endpoint} request failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Endpoint {endpoint} returned status {status}")]
    BadStatus { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote terminal session errors.
#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Signed URL request failed: {0}")]
    Presign(String),

    #[error("Session bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("Websocket connect to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("Websocket send failed: {0}")]
    Send(String),

    #[error("Websocket closed unexpectedly")]
    Closed,

    #[error("Step {step} output did not match expected pattern {pattern}")]
    ExpectFailed { step: usize, pattern: String },
}

/// Result type alias for spamwatch.
pub type Result<T> = std::result::Result<T, Error>;
