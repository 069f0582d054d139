use crate::utils::error::{KyoError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_origin, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com";
pub const DEFAULT_CLOUDINARY_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub store: Option<StoreConfig>,
    pub firestore: Option<FirestoreConfig>,
    pub identity: Option<IdentityConfig>,
    pub images: Option<ImagesConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: Option<StoreBackend>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub database: Option<String>,
    pub base_url: Option<String>,
    pub page_size: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Falls back to `firestore.api_key`; both belong to the same web app.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub secure_token_url: Option<String>,
    /// When set, only these accounts may use the admin API.
    pub admin_emails: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesConfig {
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub base_url: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub max_files: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    pub level: Option<String>,
}

/// Resolved Firestore settings handed to the adapter.
#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: String,
    pub page_size: usize,
    pub timeout: Duration,
}

/// Resolved identity provider settings.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub base_url: String,
    pub secure_token_url: String,
    pub api_key: String,
    pub admin_emails: Vec<String>,
    pub timeout: Duration,
}

/// Resolved image host settings.
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub base_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub max_upload_bytes: usize,
    pub max_files: usize,
    pub timeout: Duration,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| KyoError::ConfigError {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| KyoError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left
    /// in place and rejected later by validation.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| KyoError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn host(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.host.as_deref())
            .unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(3000)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }

    pub fn cors_origins(&self) -> &[String] {
        self.server
            .as_ref()
            .and_then(|s| s.cors_origins.as_deref())
            .unwrap_or_default()
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store
            .as_ref()
            .and_then(|s| s.backend)
            .unwrap_or_default()
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    fn firestore_api_key(&self) -> Option<&String> {
        self.firestore.as_ref().and_then(|f| f.api_key.as_ref())
    }

    pub fn firestore_settings(&self) -> Result<FirestoreSettings> {
        let section = self.firestore.clone().unwrap_or_default();
        let project_id = validate_required_field("firestore.project_id", &section.project_id)?;
        let api_key = validate_required_field("firestore.api_key", &section.api_key)?;

        Ok(FirestoreSettings {
            base_url: trim_url(section.base_url.as_deref().unwrap_or(DEFAULT_FIRESTORE_URL)),
            project_id: project_id.clone(),
            database: section.database.clone().unwrap_or_else(|| "(default)".to_string()),
            api_key: api_key.clone(),
            page_size: section.page_size.unwrap_or(300),
            timeout: Duration::from_secs(section.timeout_seconds.unwrap_or(10)),
        })
    }

    pub fn identity_settings(&self) -> Result<IdentitySettings> {
        let section = self.identity.clone().unwrap_or_default();
        let api_key = section
            .api_key
            .as_ref()
            .or_else(|| self.firestore_api_key())
            .ok_or_else(|| KyoError::MissingConfigError {
                field: "identity.api_key".to_string(),
            })?;

        Ok(IdentitySettings {
            base_url: trim_url(section.base_url.as_deref().unwrap_or(DEFAULT_IDENTITY_URL)),
            secure_token_url: trim_url(
                section
                    .secure_token_url
                    .as_deref()
                    .unwrap_or(DEFAULT_SECURE_TOKEN_URL),
            ),
            api_key: api_key.clone(),
            admin_emails: section
                .admin_emails
                .unwrap_or_default()
                .into_iter()
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
            timeout: Duration::from_secs(section.timeout_seconds.unwrap_or(10)),
        })
    }

    pub fn image_settings(&self) -> Result<ImageSettings> {
        let section = self.images.clone().unwrap_or_default();
        let cloud_name = validate_required_field("images.cloud_name", &section.cloud_name)?;
        let upload_preset = validate_required_field("images.upload_preset", &section.upload_preset)?;

        Ok(ImageSettings {
            base_url: trim_url(section.base_url.as_deref().unwrap_or(DEFAULT_CLOUDINARY_URL)),
            cloud_name: cloud_name.clone(),
            upload_preset: upload_preset.clone(),
            max_upload_bytes: section.max_upload_bytes.unwrap_or(10 * 1024 * 1024),
            max_files: section.max_files.unwrap_or(10),
            timeout: Duration::from_secs(section.timeout_seconds.unwrap_or(60)),
        })
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("server.host", self.host())?;
        validate_range("server.port", self.port(), 1, u16::MAX)?;
        for origin in self.cors_origins() {
            validate_origin("server.cors_origins", origin)?;
        }

        if self.store_backend() == StoreBackend::Firestore {
            let firestore = self.firestore_settings()?;
            validate_url("firestore.base_url", &firestore.base_url)?;
            validate_resolved("firestore.project_id", &firestore.project_id)?;
            validate_resolved("firestore.api_key", &firestore.api_key)?;
            validate_non_empty_string("firestore.database", &firestore.database)?;
            validate_range("firestore.page_size", firestore.page_size, 1, 1000)?;
        }

        let identity = self.identity_settings()?;
        validate_url("identity.base_url", &identity.base_url)?;
        validate_url("identity.secure_token_url", &identity.secure_token_url)?;
        validate_resolved("identity.api_key", &identity.api_key)?;

        let images = self.image_settings()?;
        validate_url("images.base_url", &images.base_url)?;
        validate_resolved("images.cloud_name", &images.cloud_name)?;
        validate_resolved("images.upload_preset", &images.upload_preset)?;
        validate_positive_number("images.max_upload_bytes", images.max_upload_bytes, 1)?;
        validate_positive_number("images.max_files", images.max_files, 1)?;

        if let Some(level) = self.log_level() {
            if level.parse::<tracing_subscriber::filter::LevelFilter>().is_err() {
                return Err(KyoError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: "Use one of: trace, debug, info, warn, error".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Rejects values whose `${VAR}` placeholder never got substituted.
fn validate_resolved(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.contains("${") {
        return Err(KyoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Environment variable is not set".to_string(),
        });
    }
    Ok(())
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
