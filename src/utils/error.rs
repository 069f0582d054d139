use thiserror::Error;

#[derive(Error, Debug)]
pub enum KyoError {
    #[error("Remote request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("{service} returned {status}: {message}")]
    RemoteError {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Malformed {service} payload: {message}")]
    DecodeError {
        service: &'static str,
        message: String,
    },

    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Validation,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl KyoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ApiError(_) | Self::RemoteError { .. } => ErrorCategory::Network,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::ValidationError { .. } | Self::PayloadTooLarge { .. } => ErrorCategory::Validation,
            Self::SerializationError(_) | Self::DecodeError { .. } | Self::NotFound { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Authentication => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => match self {
                Self::NotFound { .. } => ErrorSeverity::Low,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML config file and the environment variables it references"
            }
            ErrorCategory::Network => {
                "Check network access to Firestore, Identity Toolkit and Cloudinary, then retry"
            }
            ErrorCategory::Authentication => "Sign in again to obtain a fresh ID token",
            ErrorCategory::Validation => "Fix the highlighted input and submit again",
            ErrorCategory::Data => "Verify the record exists and has the expected shape",
            ErrorCategory::System => "Check file permissions and available resources",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message } | Self::Unauthorized { message } => message.clone(),
            Self::NotFound { .. } => "Produk tidak ditemukan.".to_string(),
            Self::PayloadTooLarge { limit } => {
                format!("Upload is too large. The limit per request is {limit} bytes.")
            }
            Self::RemoteError { service, .. } | Self::DecodeError { service, .. } => {
                format!("{service} is unavailable right now. Please try again.")
            }
            Self::ApiError(_) => "A remote service could not be reached. Please try again.".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => format!("Invalid configuration: {self}"),
            Self::IoError(_) | Self::SerializationError(_) => {
                "An internal error occurred. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, KyoError>;
