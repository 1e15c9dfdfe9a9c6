//! AWS Client
//!
//! The authenticated session shared by every counter, and the listing
//! backend that routes calls through the SDK dispatcher.

use super::auth::{load_sdk_config, CredentialSource, SessionError};
use crate::resource::sdk_dispatch::{self, sdk_error};
use crate::resource::{ListRequest, ListingBackend, Page};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_types::SdkConfig;

/// Authenticated AWS session
#[derive(Clone)]
pub struct AwsSession {
    config: SdkConfig,
    account_id: String,
}

impl AwsSession {
    /// Load credentials from `source` and verify them against STS
    pub async fn establish(source: &CredentialSource) -> Result<Self, SessionError> {
        let config = load_sdk_config(source).await;
        Self::from_config(config).await
    }

    /// Verify an already loaded SDK config and resolve the account ID
    pub async fn from_config(config: SdkConfig) -> Result<Self, SessionError> {
        let account_id = fetch_account_id(&config)
            .await
            .map_err(|e| SessionError::Credentials(e.into()))?;

        tracing::info!("Session established for account {}", account_id);

        Ok(Self { config, account_id })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Listing backend bound to this session
    pub fn backend(&self) -> AwsBackend {
        AwsBackend::new(self.config.clone())
    }
}

/// Resolve the account owning the session credentials
async fn fetch_account_id(config: &SdkConfig) -> Result<String> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(sdk_error)
        .context("Failed to get caller identity")?;

    identity
        .account()
        .map(|a| a.to_string())
        .context("Caller identity did not include an account ID")
}

/// Listing backend backed by the AWS SDK
#[derive(Clone)]
pub struct AwsBackend {
    config: SdkConfig,
}

impl AwsBackend {
    pub fn new(config: SdkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ListingBackend for AwsBackend {
    async fn list_page(&self, request: &ListRequest<'_>, page_token: Option<&str>) -> Result<Page> {
        sdk_dispatch::invoke_sdk(&self.config, request, page_token).await
    }
}

const MAX_ERROR_CHARS: usize = 200;

/// Format an AWS API error for display
pub fn format_aws_error(error: &anyhow::Error) -> String {
    let error_str = format!("{:#}", error);

    if error_str.contains("AccessDenied") || error_str.contains("UnauthorizedOperation") {
        return "Permission denied. Check the IAM permissions of these credentials.".to_string();
    }
    if error_str.contains("ExpiredToken") || error_str.contains("RequestExpired") {
        return "Credentials have expired. Refresh them and try again.".to_string();
    }
    if error_str.contains("InvalidClientTokenId")
        || error_str.contains("UnrecognizedClient")
        || error_str.contains("SignatureDoesNotMatch")
        || error_str.contains("AuthFailure")
    {
        return "Authentication failed. Check the access key, secret key or profile.".to_string();
    }
    if error_str.contains("OptInRequired") {
        return "A region is not enabled for this account. Use --region to skip it.".to_string();
    }
    if error_str.contains("Throttling") || error_str.contains("TooManyRequests") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("dispatch failure") {
        return "Could not reach the AWS endpoint. Check your network connection.".to_string();
    }

    // Truncate long error messages
    let mut chars = error_str
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !c.is_control());
    let sanitized: String = chars.by_ref().take(MAX_ERROR_CHARS).collect();

    if chars.next().is_some() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
