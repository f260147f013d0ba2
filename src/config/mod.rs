use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Directory under the upload root holding in-flight staged files
pub const STAGING_DIR: &str = "temp";

/// Default MIME allowlist, checked against the declared content type only
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "video/mp4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Reads `APP_ENV`, falling back to `NODE_ENV` for existing deployments
    pub fn from_env() -> Self {
        let value = env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .unwrap_or_default();

        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    /// Dotenv file loaded before the configuration is read
    pub fn env_file(self) -> &'static str {
        match self {
            Environment::Production => ".env.production",
            Environment::Development => ".env.development",
        }
    }
}

/// Media server configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub environment: Environment,

    /// Root of the stored media tree (default: `<cwd>/uploads`, `UPLOAD_DIR` in production)
    pub upload_root: PathBuf,

    /// Base URL used by the legacy `/upload` route to build absolute links
    pub base_url: String,

    /// Maximum size of a single file in bytes (default: 100 MiB)
    pub max_file_size: usize,

    /// Maximum number of files accepted by the batch route (default: 10)
    pub max_files_per_request: usize,

    pub allowed_mime_types: Vec<String>,

    /// Allowed CORS Origins (comma separated, `*` for any)
    pub allowed_origins: Vec<String>,

    /// Serve `<upload_root>` under `/uploads` (default: outside production only)
    pub serve_uploads: bool,

    /// Reject single uploads whose `hash` query does not match the stored bytes
    pub verify_client_hash: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            upload_root: PathBuf::from("uploads"),
            base_url: "http://localhost:4000".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100 MiB
            max_files_per_request: 10,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_origins: vec!["*".to_string()],
            serve_uploads: true,
            verify_client_hash: false,
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_env();
        let default = Self::default();

        let upload_root = match env::var("UPLOAD_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ if environment.is_production() => {
                anyhow::bail!("UPLOAD_DIR must be set in production")
            }
            _ => env::current_dir()
                .context("failed to resolve current directory")?
                .join("uploads"),
        };

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| {
            if environment.is_production() {
                "https://media.yourdomain.com".to_string()
            } else {
                default.base_url.clone()
            }
        });

        Ok(Self {
            environment,
            upload_root,
            base_url: base_url.trim_end_matches('/').to_string(),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_files_per_request: env::var("MAX_FILES_PER_REQUEST")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.max_files_per_request),

            allowed_mime_types: env::var("ALLOWED_MIME_TYPES")
                .ok()
                .map(|v| split_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(default.allowed_mime_types),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| split_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(default.allowed_origins),

            serve_uploads: env::var("SERVE_UPLOADS")
                .map(|v| parse_flag(&v))
                .unwrap_or(!environment.is_production()),

            verify_client_hash: env::var("VERIFY_CLIENT_HASH")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.verify_client_hash),
        })
    }

    /// Deterministic config rooted at `upload_root`, no environment lookups
    pub fn development(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            ..Self::default()
        }
    }

    /// Scratch directory multipart fields are staged into
    pub fn temp_dir(&self) -> PathBuf {
        self.upload_root.join(STAGING_DIR)
    }

    /// Request body ceiling: every allowed file at full size plus multipart overhead
    pub fn body_limit(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files_per_request)
            .saturating_add(10 * 1024 * 1024)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes"
}
