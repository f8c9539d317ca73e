//! Startup secret resolution from AWS Secrets Manager.
//!
//! In the function runtime no credentials are shipped with the binary;
//! the four sensitive settings are read from the secret store under the
//! configured names instead. The service-account key arrives as the secret
//! payload and is handed to the directory adapter via a temp file path.

use aws_sdk_secretsmanager::Client;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

pub struct SecretsResolver {
    client: Client,
}

impl SecretsResolver {
    /// Build a resolver using ambient AWS credentials.
    pub async fn new() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&sdk_config),
        }
    }

    async fn get(&self, name: &str) -> CliResult<String> {
        let result = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                CliError::Secrets(format!("failed to get secret {name:?}: {}", e.into_service_error()))
            })?;

        let value = if let Some(secret_string) = result.secret_string() {
            secret_string.to_string()
        } else if let Some(secret_binary) = result.secret_binary() {
            String::from_utf8(secret_binary.as_ref().to_vec())
                .map_err(|_| CliError::Secrets(format!("secret {name:?} is not valid utf-8")))?
        } else {
            return Err(CliError::Secrets(format!(
                "secret {name:?} has neither a string nor a binary value"
            )));
        };

        if value.is_empty() {
            return Err(CliError::Secrets(format!("secret {name:?} is empty")));
        }

        info!(secret = name, "secret resolved");
        Ok(value)
    }

    /// Fill the sensitive settings from their configured secret names. The
    /// service-account key payload is written next to the work dir and the
    /// config is pointed at it.
    pub async fn resolve(&self, config: &mut AppConfig) -> CliResult<()> {
        let key_payload = self.get(&config.gws_service_account_file_secret_name).await?;
        let key_path = std::env::temp_dir().join("dirsync-service-account.json");
        tokio::fs::write(&key_path, key_payload.as_bytes()).await?;
        config.gws_service_account_file = key_path;

        config.gws_user_email = self.get(&config.gws_user_email_secret_name).await?;
        config.scim_endpoint = self.get(&config.scim_endpoint_secret_name).await?;
        config.scim_access_token = self.get(&config.scim_access_token_secret_name).await?;
        Ok(())
    }
}
