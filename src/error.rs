use thiserror::Error;

/// Main error type for the Asset Studio library
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Focal-point analysis errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Vision request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Vision service returned HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Could not parse vision response: {reason}")]
    ParseFailed { reason: String },

    #[error("API key not set (expected in ${var})")]
    MissingApiKey { var: String },

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Rendering and encoding errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to decode image {name}: {reason}")]
    DecodeFailed { name: String, reason: String },

    #[error("Invalid dimensions: {details}")]
    InvalidDimensions { details: String },

    #[error("Failed to load font {path}: {reason}")]
    FontLoad { path: String, reason: String },

    #[error("JPEG encoding failed: {reason}")]
    EncodingFailed { reason: String },
}

/// Batch state-machine errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No item with id {id} in the batch")]
    ItemNotFound { id: String },

    #[error("Item {id} is still pending")]
    ItemPending { id: String },

    #[error("Invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("Studio worker has stopped")]
    WorkerStopped,
}

/// Export sequencing errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write artifact {name}: {reason}")]
    SinkFailed { name: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;

impl StudioError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (the operator can simply try again)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Analysis(AnalysisError::RequestFailed { .. }) => true,
            Self::Analysis(AnalysisError::BadStatus { status, .. }) => *status == 429 || *status >= 500,
            Self::Export(ExportError::SinkFailed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Analysis(AnalysisError::MissingApiKey { var }) => {
                format!("No vision API key found. Set {} or run with --offline.", var)
            }
            Self::Render(RenderError::DecodeFailed { name, .. }) => {
                format!("Could not read '{}'. Only PNG and JPEG screenshots are supported.", name)
            }
            Self::Render(RenderError::FontLoad { path, .. }) => {
                format!("Headline font '{}' could not be loaded.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
