//! AWS API interaction module
//!
//! This module provides the core functionality for talking to AWS:
//! credential selection, the verified session and the region registry.
//!
//! # Module Structure
//!
//! - [`auth`] - Credential source selection and SDK config loading
//! - [`client`] - Verified session and the SDK-backed listing backend
//! - [`regions`] - Supported regions per service
//!
//! # Example
//!
//! ```ignore
//! use crate::aws::auth::CredentialSource;
//! use crate::aws::client::AwsSession;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let session = AwsSession::establish(&CredentialSource::Default).await?;
//!     println!("{}", session.account_id());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod regions;
