//! AWS Authentication
//!
//! Chooses where credentials come from (explicit key pair, named profile or
//! the default provider chain) and loads the shared SDK configuration.

use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Credentials;
use aws_types::region::Region;
use aws_types::SdkConfig;
use std::env;
use thiserror::Error;

/// Region used when nothing else configures one
pub const FALLBACK_REGION: &str = "us-east-1";

/// Provider name attached to credentials passed on the command line
const CLI_PROVIDER_NAME: &str = "awscensus-cli";

/// Errors raised while establishing a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(
        "Secret key not specified. A secret key must be provided when the command line access key option is provided."
    )]
    MissingSecret,
    #[error("Error establishing AWS connection. Likely bad credentials provided.")]
    Credentials(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Where session credentials come from
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Explicit access key and secret key
    Static { access_key: String, secret_key: String },
    /// Named profile from the shared config/credentials files
    Profile(String),
    /// Default provider chain (environment, shared files, IMDS, ...)
    Default,
}

// Keep the secret out of logs
impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { access_key, .. } => f
                .debug_struct("Static")
                .field("access_key", access_key)
                .field("secret_key", &"***")
                .finish(),
            Self::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            Self::Default => f.write_str("Default"),
        }
    }
}

impl CredentialSource {
    /// Select a credential source from command line options.
    ///
    /// Precedence: key pair, then profile, then the default chain. An access
    /// key without a secret is an error.
    pub fn from_options(
        access: Option<&str>,
        secret: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Self, SessionError> {
        match (access, secret) {
            (Some(_), None) => Err(SessionError::MissingSecret),
            (Some(access), Some(secret)) => Ok(Self::Static {
                access_key: access.to_string(),
                secret_key: secret.to_string(),
            }),
            (None, secret) => {
                if secret.is_some() {
                    tracing::warn!("Secret key given without an access key; ignoring it");
                }
                Ok(profile
                    .map(|p| Self::Profile(p.to_string()))
                    .unwrap_or(Self::Default))
            }
        }
    }

    /// Human-readable description for progress output
    pub fn describe(&self) -> String {
        match self {
            Self::Static { .. } => "the provided access key".to_string(),
            Self::Profile(name) => format!("the profile- {}", name),
            Self::Default => "default path credentials".to_string(),
        }
    }
}

/// Region provider: AWS_DEFAULT_REGION, then the SDK chain, then us-east-1
fn home_region_provider() -> RegionProviderChain {
    let env_region = env::var("AWS_DEFAULT_REGION").ok().map(Region::new);

    RegionProviderChain::first_try(env_region)
        .or_default_provider()
        .or_else(Region::new(FALLBACK_REGION))
}

/// Load the SDK configuration shared by every service client
pub async fn load_sdk_config(source: &CredentialSource) -> SdkConfig {
    tracing::info!("Loading AWS config from {:?}", source);

    let loader = aws_config::defaults(BehaviorVersion::latest()).region(home_region_provider());

    let loader = match source {
        CredentialSource::Static {
            access_key,
            secret_key,
        } => loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            CLI_PROVIDER_NAME,
        )),
        CredentialSource::Profile(name) => loader.profile_name(name),
        CredentialSource::Default => loader,
    };

    loader.load().await
}
