//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_ACCESS_TOKEN_SECRET` - Access-token signing secret (high entropy)
//! - `JWT_REFRESH_TOKEN_SECRET` - Refresh-token signing secret (high entropy)
//! - `ADMIN_EMAIL` - Bootstrap admin login email
//! - `ADMIN_PASSWORD` - Bootstrap admin login password
//!
//! ## Optional
//! - `GOOGLE_CLIENT_ID` - Google OAuth client ID (enables social sign-in)
//! - `JWT_ACCESS_TTL_SECS` - Access token lifetime (default: 900 = 15 min)
//! - `JWT_REFRESH_TTL_SECS` - Refresh token lifetime (default: 604800 = 7 d)
//! - `REQUEST_DEADLINE_SECS` - Per-operation deadline (default: 10)
//!
//! A missing signing secret is the `SecretMissing` failure mode: it is a
//! startup error surfaced here, never a per-request one.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(10);

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JWT configuration for the token service
    pub jwt: JwtConfig,
    /// Bootstrap admin credentials
    pub admin: AdminConfig,
    /// Google OAuth client ID (optional - enables social sign-in)
    pub google_client_id: Option<String>,
    /// Per-operation request deadline
    pub request_deadline: Duration,
}

/// JWT signing configuration.
///
/// Access and refresh tokens are signed with distinct secrets so a
/// leaked access secret cannot mint refresh tokens.
/// Implements `Debug` manually to redact both secrets.
#[derive(Clone)]
pub struct JwtConfig {
    /// Access-token signing secret
    pub access_secret: SecretString,
    /// Refresh-token signing secret
    pub refresh_secret: SecretString,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Bootstrap admin credentials.
///
/// The admin dashboard login is checked against this pair before the
/// admin user record is looked up.
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminConfig {
    /// Admin login email
    pub email: String,
    /// Admin login password
    pub password: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid,
    /// or if secrets fail validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let jwt = JwtConfig::from_env()?;
        let admin = AdminConfig::from_env()?;
        let google_client_id = get_optional_env("GOOGLE_CLIENT_ID");
        let request_deadline =
            get_duration_secs("REQUEST_DEADLINE_SECS", DEFAULT_REQUEST_DEADLINE)?;

        Ok(Self {
            jwt,
            admin,
            google_client_id,
            request_deadline,
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_secret: get_validated_secret("JWT_ACCESS_TOKEN_SECRET")?,
            refresh_secret: get_validated_secret("JWT_REFRESH_TOKEN_SECRET")?,
            access_ttl: get_duration_secs("JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL)?,
            refresh_ttl: get_duration_secs("JWT_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL)?,
        })
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            email: get_required_env("ADMIN_EMAIL")?,
            password: get_required_secret("ADMIN_PASSWORD")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an optional duration in whole seconds, falling back to a default.
fn get_duration_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_SECRET_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real signing secrets are randomly generated and have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a signing secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
