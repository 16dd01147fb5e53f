use thiserror::Error;

/// Main error type for repo-pulse
#[derive(Error, Debug)]
pub enum RepoPulseError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// HTTP/transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the GitHub API
    #[error("GitHub API error (status {status}): {message}")]
    GitHubApi { status: u16, message: String },

    /// Non-success response from the OpenAI API
    #[error("OpenAI API error (status {status}): {message}")]
    OpenAiApi { status: u16, message: String },

    /// Local store errors
    #[error("Store error: {0}")]
    Store(#[from] sled::Error),

    /// Malformed or missing input to the pipeline
    #[error("Invalid input: {0}")]
    Validation(String),

    /// No stored insight with the given identifier
    #[error("Insight not found: {0}")]
    InsightNotFound(String),

    /// Regex errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for repo-pulse operations
pub type Result<T> = std::result::Result<T, RepoPulseError>;

impl RepoPulseError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new GitHub API error
    pub fn github_api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::GitHubApi {
            status,
            message: message.into(),
        }
    }

    /// Create a new OpenAI API error
    pub fn openai_api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::OpenAiApi {
            status,
            message: message.into(),
        }
    }
}
