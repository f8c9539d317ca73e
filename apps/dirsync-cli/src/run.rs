//! Wiring for the `sync` verb: adapters built from configuration, signal
//! handling, and the driver invocation.

use std::sync::Arc;

use dirsync_core::SyncService;
use dirsync_gws::{DirectoryClient, GwsIdentityProvider, ServiceAccountKey, TokenSource};
use dirsync_scim::{ScimClient, ScimTargetProvider};
use dirsync_state::S3StateRepository;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AppConfig, SyncArgs};
use crate::error::CliResult;
use crate::logging;
use crate::secrets::SecretsResolver;

pub async fn execute(args: SyncArgs) -> CliResult<()> {
    let mut config = AppConfig::load(&args)?;
    logging::init(&config)?;

    if config.is_lambda {
        SecretsResolver::new().await.resolve(&mut config).await?;
    }
    config.validate()?;

    // Upstream directory.
    let key_bytes = tokio::fs::read(&config.gws_service_account_file).await?;
    let key = ServiceAccountKey::from_json(&key_bytes)?;
    let tokens = Arc::new(TokenSource::new(key, &config.gws_user_email)?);
    let directory = DirectoryClient::new(tokens)?;
    let provider = Arc::new(GwsIdentityProvider::new(directory));

    // Downstream SCIM target.
    let scim_client = ScimClient::new(
        &config.scim_endpoint,
        SecretString::from(config.scim_access_token.clone()),
    )?;
    let scim = Arc::new(ScimTargetProvider::new(scim_client));

    // A second Ctrl-C falls through to the default handler and kills the
    // process.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing the current phase and aborting");
            signal_token.cancel();
        }
    });

    let mut service = SyncService::new(provider, scim).with_cancellation(cancel);
    if config.state_enabled {
        let repository =
            S3StateRepository::new(&config.aws_s3_bucket_name, &config.aws_s3_bucket_key).await?;
        service = service.with_state(Arc::new(repository));
    } else {
        info!("state persistence disabled, every run reconciles against the live target");
    }

    let report = service
        .sync_groups_and_users(&config.gws_groups_filter)
        .await?;

    if report.is_noop() {
        info!("nothing to do, target already matches the directory");
    }
    Ok(())
}
