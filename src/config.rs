//! Configuration management using the prefer crate.
//!
//! Settings are layered: built-in defaults, then a config file (discovered by
//! prefer or passed with `--config`), then environment variables, which take
//! highest precedence. Environment variable names are the ones deployments
//! already use (`JWT_SECRET_KEY`, `S3_BUCKET_NAME`, ...).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{JwtService, PasswordHasher};
use crate::repository::DieselDbContext;

/// Default database filename.
const DEFAULT_DATABASE_FILENAME: &str = "docanalysis.db";

/// Default local object storage subdirectory.
const STORAGE_SUBDIR: &str = "objects";

/// Default application name.
pub const DEFAULT_APP_NAME: &str = "Document Analysis API";

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Invalid or incomplete configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set")]
    MissingJwtSecret,

    #[error("unsupported JWT algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("S3_BUCKET_NAME must be set when the S3 storage backend is selected")]
    MissingBucket,

    #[error("failed to read config file {path}: {message}")]
    File { path: PathBuf, message: String },
}

/// Where uploaded objects are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
}

impl StorageBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Some(Self::S3),
            "local" | "fs" | "filesystem" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Token and password settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    /// Lifetime of tokens issued at login.
    pub jwt_expiration_minutes: i64,
    /// Lifetime granted by a renewal.
    pub renewal_minutes: i64,
    pub bcrypt_cost: u32,
    /// Role required to upload CSV files.
    pub upload_role: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_algorithm: "HS256".to_string(),
            jwt_expiration_minutes: 15,
            renewal_minutes: 15,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upload_role: "uploader".to_string(),
        }
    }
}

/// S3 bucket settings.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// Object storage settings.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Root directory for the local backend.
    pub local_dir: PathBuf,
    pub s3: S3Settings,
    /// Lifetime of presigned download URLs.
    pub presign_secs: u64,
}

/// Cognitive service endpoints.
#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub form_recognizer_endpoint: Option<String>,
    pub form_recognizer_key: Option<String>,
    pub text_analytics_endpoint: Option<String>,
    pub text_analytics_key: Option<String>,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    pub request_timeout_secs: u64,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            form_recognizer_endpoint: None,
            form_recognizer_key: None,
            text_analytics_endpoint: None,
            text_analytics_key: None,
            poll_interval_ms: 1000,
            max_polls: 60,
            request_timeout_secs: 60,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub debug: bool,
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Default bind address for `serve`.
    pub bind: String,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
    pub azure: AzureSettings,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> current dir
        let data_dir = dirs::data_dir()
            .map(|d| d.join("docanalysis"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings rooted at a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            debug: false,
            storage: StorageSettings {
                backend: StorageBackend::default(),
                local_dir: data_dir.join(STORAGE_SUBDIR),
                s3: S3Settings::default(),
                presign_secs: crate::storage::DEFAULT_PRESIGN_SECS,
            },
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            auth: AuthSettings::default(),
            azure: AzureSettings::default(),
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            let path = self.data_dir.join(&self.database_filename);
            format!("sqlite:{}", path.display())
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        if self.storage.backend == StorageBackend::Local {
            fs::create_dir_all(&self.storage.local_dir)?;
        }
        Ok(())
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> DieselDbContext {
        DieselDbContext::from_url(&self.database_url())
    }

    pub fn jwt_service(&self) -> Result<JwtService, ConfigError> {
        JwtService::new(
            &self.auth.jwt_secret,
            &self.auth.jwt_algorithm,
            self.auth.jwt_expiration_minutes,
        )
        .map_err(|_| ConfigError::UnsupportedAlgorithm(self.auth.jwt_algorithm.clone()))
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.auth.bcrypt_cost)
    }

    /// Check settings needed to serve requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        self.jwt_service()?;
        if self.storage.backend == StorageBackend::S3 && self.storage.s3.bucket.is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            tracing::debug!("Using DATABASE_URL from environment: {}", url);
            self.database_url = Some(url);
        }
        if let Some(name) = get("APP_NAME") {
            self.app_name = name;
        }
        if let Some(debug) = get("DEBUG") {
            self.debug = parse_bool(&debug);
        }
        if let Some(secret) = get("JWT_SECRET_KEY") {
            self.auth.jwt_secret = secret;
        }
        if let Some(alg) = get("JWT_ALGORITHM") {
            self.auth.jwt_algorithm = alg;
        }
        if let Some(minutes) = get("JWT_EXPIRATION_MINUTES") {
            set_parsed(&mut self.auth.jwt_expiration_minutes, "JWT_EXPIRATION_MINUTES", &minutes);
        }
        if let Some(role) = get("UPLOAD_ROLE") {
            self.auth.upload_role = role;
        }
        if let Some(backend) = get("STORAGE_BACKEND") {
            match StorageBackend::from_str(&backend) {
                Some(b) => self.storage.backend = b,
                None => tracing::warn!("Ignoring unknown STORAGE_BACKEND '{}'", backend),
            }
        }
        if let Some(dir) = get("STORAGE_DIR") {
            self.storage.local_dir = PathBuf::from(dir);
        }
        if let Some(bucket) = get("S3_BUCKET_NAME") {
            self.storage.s3.bucket = bucket;
        }
        if let Some(region) = get("AWS_REGION") {
            self.storage.s3.region = region;
        }
        if let Some(key) = get("AWS_ACCESS_KEY_ID") {
            self.storage.s3.access_key_id = Some(key);
        }
        if let Some(secret) = get("AWS_SECRET_ACCESS_KEY") {
            self.storage.s3.secret_access_key = Some(secret);
        }
        if let Some(v) = get("AZURE_FORM_RECOGNIZER_ENDPOINT") {
            self.azure.form_recognizer_endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_FORM_RECOGNIZER_KEY") {
            self.azure.form_recognizer_key = Some(v);
        }
        if let Some(v) = get("AZURE_TEXT_ANALYTICS_ENDPOINT") {
            self.azure.text_analytics_endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_TEXT_ANALYTICS_KEY") {
            self.azure.text_analytics_key = Some(v);
        }
    }
}

/// Whether `DEBUG` is set to a truthy value in the environment.
pub fn debug_from_env() -> bool {
    std::env::var("DEBUG").map(|v| parse_bool(&v)).unwrap_or(false)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn set_parsed<T: std::str::FromStr>(target: &mut T, key: &str, value: &str) {
    match value.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => tracing::warn!("Ignoring invalid {}='{}'", key, value),
    }
}

/// `[auth]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_expiration_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcrypt_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_role: Option<String>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<StorageBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presign_secs: Option<u64>,
}

/// `[azure]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_recognizer_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_analytics_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Configuration file structure.
///
/// Secrets (AWS and Azure keys) are only read from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    /// Data directory path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub azure: AzureConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    /// Automatically discovers docanalysis config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("docanalysis").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |message: String| ConfigError::File {
            path: path.to_path_buf(),
            message,
        };

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| file_error(e.to_string()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| file_error(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| file_error(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| file_error(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory relative paths in the file are resolved against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
        let path = PathBuf::from(path_str);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    /// Overlay the values present in this file onto `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = Self::resolve_path(data_dir, base_dir);
            settings.storage.local_dir = settings.data_dir.join(STORAGE_SUBDIR);
        }
        if let Some(ref name) = self.app_name {
            settings.app_name = name.clone();
        }
        if let Some(debug) = self.debug {
            settings.debug = debug;
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }

        let auth = &self.auth;
        if let Some(ref secret) = auth.jwt_secret {
            settings.auth.jwt_secret = secret.clone();
        }
        if let Some(ref alg) = auth.jwt_algorithm {
            settings.auth.jwt_algorithm = alg.clone();
        }
        if let Some(minutes) = auth.jwt_expiration_minutes {
            settings.auth.jwt_expiration_minutes = minutes;
        }
        if let Some(minutes) = auth.renewal_minutes {
            settings.auth.renewal_minutes = minutes;
        }
        if let Some(cost) = auth.bcrypt_cost {
            settings.auth.bcrypt_cost = cost;
        }
        if let Some(ref role) = auth.upload_role {
            settings.auth.upload_role = role.clone();
        }

        let storage = &self.storage;
        if let Some(backend) = storage.backend {
            settings.storage.backend = backend;
        }
        if let Some(ref dir) = storage.local_dir {
            settings.storage.local_dir = Self::resolve_path(dir, base_dir);
        }
        if let Some(ref bucket) = storage.bucket {
            settings.storage.s3.bucket = bucket.clone();
        }
        if let Some(ref region) = storage.region {
            settings.storage.s3.region = region.clone();
        }
        if let Some(secs) = storage.presign_secs {
            settings.storage.presign_secs = secs;
        }

        let azure = &self.azure;
        if let Some(ref endpoint) = azure.form_recognizer_endpoint {
            settings.azure.form_recognizer_endpoint = Some(endpoint.clone());
        }
        if let Some(ref endpoint) = azure.text_analytics_endpoint {
            settings.azure.text_analytics_endpoint = Some(endpoint.clone());
        }
        if let Some(ms) = azure.poll_interval_ms {
            settings.azure.poll_interval_ms = ms;
        }
        if let Some(polls) = azure.max_polls {
            settings.azure.max_polls = polls;
        }
        if let Some(secs) = azure.request_timeout_secs {
            settings.azure.request_timeout_secs = secs;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Load settings: defaults, then config file, then environment.
/// Returns (Settings, Config) tuple.
pub async fn load_settings(options: LoadOptions) -> (Settings, Config) {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await.unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Config::default()
        }),
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(data_dir) = options.data_dir {
        settings.storage.local_dir = data_dir.join(STORAGE_SUBDIR);
        settings.data_dir = data_dir;
    }

    settings.apply_env();

    (settings, config)
}
