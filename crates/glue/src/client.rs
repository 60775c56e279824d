//! Shared AWS SDK configuration for the Glue and SSM clients.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_glue::config::Credentials;
use aws_types::region::Region;
use tracing::info;

use lakesync_core::AwsConfig;

#[derive(Debug, thiserror::Error)]
pub enum GlueError {
    /// Static credentials were only partially provided.
    #[error("incomplete AWS credentials: {0}")]
    Credentials(String),
}

/// Load the SDK config for `aws`.
///
/// Explicit access keys take precedence over the default provider chain;
/// `endpoint_url` points every client at a local emulator.
pub async fn load_sdk_config(aws: &AwsConfig) -> Result<SdkConfig, GlueError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(aws.region.clone()));

    match (&aws.access_key_id, &aws.secret_access_key) {
        (Some(key), Some(secret)) => {
            let creds = Credentials::new(key, secret, aws.session_token.clone(), None, "lakesync-env");
            loader = loader.credentials_provider(creds);
        }
        (Some(_), None) => {
            return Err(GlueError::Credentials("AWS_SECRET_ACCESS_KEY not set".into()));
        }
        (None, Some(_)) => {
            return Err(GlueError::Credentials("AWS_ACCESS_KEY_ID not set".into()));
        }
        (None, None) => {}
    }

    if let Some(endpoint) = aws.endpoint_url.as_deref().filter(|e| !e.is_empty()) {
        loader = loader.endpoint_url(endpoint);
    }

    Ok(loader.load().await)
}

/// Glue and SSM clients built from one SDK config.
#[derive(Clone)]
pub struct AwsClients {
    pub glue: aws_sdk_glue::Client,
    pub ssm: aws_sdk_ssm::Client,
}

impl AwsClients {
    pub async fn new(aws: &AwsConfig) -> Result<Self, GlueError> {
        let sdk = load_sdk_config(aws).await?;
        info!(
            region = %aws.region,
            endpoint = aws.endpoint_url.as_deref().unwrap_or("default"),
            "AWS clients initialised"
        );
        Ok(Self {
            glue: aws_sdk_glue::Client::new(&sdk),
            ssm: aws_sdk_ssm::Client::new(&sdk),
        })
    }
}
