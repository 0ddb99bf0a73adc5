//! Google ID token verification.
//!
//! Social sign-in sends the Google-issued ID token credential to the
//! API; we verify it against Google's `tokeninfo` endpoint and check
//! the audience matches our client id before trusting the profile.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

/// Google's ID token introspection endpoint.
const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Profile claims extracted from a verified Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Google's stable subject id for the account.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

/// Errors from Google credential verification.
#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    /// Google rejected the credential or it failed to parse.
    #[error("google verification failed: {0}")]
    Verification(String),

    /// The token was issued for a different OAuth client.
    #[error("google token audience mismatch")]
    AudienceMismatch,

    /// Social sign-in is not configured for this deployment.
    #[error("google client id not configured")]
    NotConfigured,
}

/// Verifies Google ID token credentials.
#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    /// Verify a credential and return the profile it asserts.
    async fn verify(&self, credential: &str) -> Result<GoogleProfile, GoogleError>;
}

/// Verifier backed by Google's `tokeninfo` endpoint.
pub struct HttpGoogleVerifier {
    client: reqwest::Client,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    #[serde(flatten)]
    profile: GoogleProfile,
}

impl HttpGoogleVerifier {
    #[must_use]
    pub fn new(client_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
        }
    }
}

#[async_trait]
impl GoogleVerifier for HttpGoogleVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, credential: &str) -> Result<GoogleProfile, GoogleError> {
        let response = self
            .client
            .get(TOKENINFO_ENDPOINT)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|err| GoogleError::Verification(err.to_string()))?;

        if !response.status().is_success() {
            return Err(GoogleError::Verification(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|err| GoogleError::Verification(err.to_string()))?;

        if info.aud != self.client_id {
            return Err(GoogleError::AudienceMismatch);
        }

        Ok(info.profile)
    }
}
