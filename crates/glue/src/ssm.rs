use async_trait::async_trait;
use tracing::debug;

use lakesync_catalog::{ParameterStore, ServiceError};

/// SSM Parameter Store lookups. SecureString values are decrypted.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<String, ServiceError> {
        debug!(parameter = %name, "Reading parameter");
        let resp = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_parameter_not_found()) {
                    ServiceError::NotFound(name.to_string())
                } else {
                    ServiceError::Service(format!("{name}: {e}"))
                }
            })?;

        resp.parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Malformed(format!("parameter {name} has no value")))
    }
}
