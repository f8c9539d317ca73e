//! Runtime configuration.
//!
//! Precedence, highest first: command-line flags, `DIRSYNC_*` environment
//! variables (wired through clap), the YAML config file, built-in defaults.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;

use crate::error::{CliError, CliResult};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "text";
pub const DEFAULT_SYNC_METHOD: &str = "groups";
pub const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "credentials.json";
pub const DEFAULT_BUCKET_KEY: &str = "data/state.json";

pub const DEFAULT_GWS_SERVICE_ACCOUNT_FILE_SECRET: &str = "DIRSYNC_GWSServiceAccountFile";
pub const DEFAULT_GWS_USER_EMAIL_SECRET: &str = "DIRSYNC_GWSUserEmail";
pub const DEFAULT_SCIM_ENDPOINT_SECRET: &str = "DIRSYNC_SCIMEndpoint";
pub const DEFAULT_SCIM_ACCESS_TOKEN_SECRET: &str = "DIRSYNC_SCIMAccessToken";

/// Flags of the `sync` verb. Every option can also come from the
/// environment or the config file.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Path to the YAML config file.
    #[arg(short, long, env = "DIRSYNC_CONFIG", default_value = ".dirsync.yaml")]
    pub config: PathBuf,

    /// Log level: debug, info, warn, error (fatal and panic are accepted as
    /// aliases of error).
    #[arg(long, env = "DIRSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format: text or json.
    #[arg(long, env = "DIRSYNC_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Enumeration strategy; only "groups" is implemented.
    #[arg(long, env = "DIRSYNC_SYNC_METHOD")]
    pub sync_method: Option<String>,

    /// Service-account key file for the Workspace directory.
    #[arg(long, env = "DIRSYNC_GWS_SERVICE_ACCOUNT_FILE")]
    pub gws_service_account_file: Option<PathBuf>,

    /// Admin user the service account impersonates.
    #[arg(long, env = "DIRSYNC_GWS_USER_EMAIL")]
    pub gws_user_email: Option<String>,

    /// Directory query selecting the groups to sync; repeatable.
    #[arg(long, env = "DIRSYNC_GWS_GROUPS_FILTER", value_delimiter = ',')]
    pub gws_groups_filter: Option<Vec<String>>,

    /// Directory query selecting users; repeatable.
    #[arg(long, env = "DIRSYNC_GWS_USERS_FILTER", value_delimiter = ',')]
    pub gws_users_filter: Option<Vec<String>>,

    /// SCIM tenant endpoint URL.
    #[arg(long, env = "DIRSYNC_SCIM_ENDPOINT")]
    pub scim_endpoint: Option<String>,

    /// SCIM bearer token.
    #[arg(long, env = "DIRSYNC_SCIM_ACCESS_TOKEN", hide_env_values = true)]
    pub scim_access_token: Option<String>,

    /// Keep a reconciliation snapshot between runs.
    #[arg(long, env = "DIRSYNC_STATE_ENABLED")]
    pub state_enabled: Option<bool>,

    /// Bucket holding the snapshot object.
    #[arg(long, env = "DIRSYNC_AWS_S3_BUCKET_NAME")]
    pub aws_s3_bucket_name: Option<String>,

    /// Key of the snapshot object.
    #[arg(long, env = "DIRSYNC_AWS_S3_BUCKET_KEY")]
    pub aws_s3_bucket_key: Option<String>,

    /// Force debug logging.
    #[arg(long, env = "DIRSYNC_DEBUG")]
    pub debug: bool,

    /// Running inside a function runtime: secrets come from the secret
    /// store and logs are emitted as JSON.
    #[arg(long, env = "DIRSYNC_IS_LAMBDA")]
    pub is_lambda: bool,
}

/// Config file document; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    log_level: Option<String>,
    log_format: Option<String>,
    sync_method: Option<String>,
    gws_service_account_file: Option<PathBuf>,
    gws_user_email: Option<String>,
    gws_service_account_file_secret_name: Option<String>,
    gws_user_email_secret_name: Option<String>,
    gws_groups_filter: Option<Vec<String>>,
    gws_users_filter: Option<Vec<String>>,
    scim_endpoint: Option<String>,
    scim_access_token: Option<String>,
    scim_endpoint_secret_name: Option<String>,
    scim_access_token_secret_name: Option<String>,
    state_enabled: Option<bool>,
    aws_s3_bucket_name: Option<String>,
    aws_s3_bucket_key: Option<String>,
    debug: Option<bool>,
    is_lambda: Option<bool>,
}

impl FileConfig {
    fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub is_lambda: bool,
    pub debug: bool,
    pub log_level: String,
    pub log_format: String,
    pub sync_method: String,
    pub gws_service_account_file: PathBuf,
    pub gws_user_email: String,
    pub gws_service_account_file_secret_name: String,
    pub gws_user_email_secret_name: String,
    pub gws_groups_filter: Vec<String>,
    pub gws_users_filter: Vec<String>,
    pub scim_endpoint: String,
    pub scim_access_token: String,
    pub scim_endpoint_secret_name: String,
    pub scim_access_token_secret_name: String,
    pub state_enabled: bool,
    pub aws_s3_bucket_name: String,
    pub aws_s3_bucket_key: String,
}

impl AppConfig {
    /// Merge flags/env over the config file over the defaults.
    pub fn load(args: &SyncArgs) -> CliResult<Self> {
        let file = FileConfig::load(&args.config)?;

        let mut config = Self {
            is_lambda: args.is_lambda || file.is_lambda.unwrap_or(false),
            debug: args.debug || file.debug.unwrap_or(false),
            log_level: args
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: args
                .log_format
                .clone()
                .or(file.log_format)
                .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
            sync_method: args
                .sync_method
                .clone()
                .or(file.sync_method)
                .unwrap_or_else(|| DEFAULT_SYNC_METHOD.to_string()),
            gws_service_account_file: args
                .gws_service_account_file
                .clone()
                .or(file.gws_service_account_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE)),
            gws_user_email: args
                .gws_user_email
                .clone()
                .or(file.gws_user_email)
                .unwrap_or_default(),
            gws_service_account_file_secret_name: file
                .gws_service_account_file_secret_name
                .unwrap_or_else(|| DEFAULT_GWS_SERVICE_ACCOUNT_FILE_SECRET.to_string()),
            gws_user_email_secret_name: file
                .gws_user_email_secret_name
                .unwrap_or_else(|| DEFAULT_GWS_USER_EMAIL_SECRET.to_string()),
            gws_groups_filter: args
                .gws_groups_filter
                .clone()
                .or(file.gws_groups_filter)
                .unwrap_or_default(),
            gws_users_filter: args
                .gws_users_filter
                .clone()
                .or(file.gws_users_filter)
                .unwrap_or_default(),
            scim_endpoint: args
                .scim_endpoint
                .clone()
                .or(file.scim_endpoint)
                .unwrap_or_default(),
            scim_access_token: args
                .scim_access_token
                .clone()
                .or(file.scim_access_token)
                .unwrap_or_default(),
            scim_endpoint_secret_name: file
                .scim_endpoint_secret_name
                .unwrap_or_else(|| DEFAULT_SCIM_ENDPOINT_SECRET.to_string()),
            scim_access_token_secret_name: file
                .scim_access_token_secret_name
                .unwrap_or_else(|| DEFAULT_SCIM_ACCESS_TOKEN_SECRET.to_string()),
            state_enabled: args
                .state_enabled
                .or(file.state_enabled)
                .unwrap_or(false),
            aws_s3_bucket_name: args
                .aws_s3_bucket_name
                .clone()
                .or(file.aws_s3_bucket_name)
                .unwrap_or_default(),
            aws_s3_bucket_key: args
                .aws_s3_bucket_key
                .clone()
                .or(file.aws_s3_bucket_key)
                .unwrap_or_else(|| DEFAULT_BUCKET_KEY.to_string()),
        };

        if config.debug {
            config.log_level = "debug".to_string();
        }
        if config.is_lambda {
            config.log_format = "json".to_string();
        }
        Ok(config)
    }

    /// Check everything the run will need. Called after secret resolution.
    pub fn validate(&self) -> CliResult<()> {
        if self.sync_method != DEFAULT_SYNC_METHOD {
            return Err(CliError::Config(format!(
                "sync_method {:?} is not implemented, only \"groups\" is",
                self.sync_method
            )));
        }
        if self.scim_endpoint.is_empty() {
            return Err(CliError::Config("scim_endpoint is required".to_string()));
        }
        if self.scim_access_token.is_empty() {
            return Err(CliError::Config("scim_access_token is required".to_string()));
        }
        if self.gws_user_email.is_empty() {
            return Err(CliError::Config("gws_user_email is required".to_string()));
        }
        if self.state_enabled && self.aws_s3_bucket_name.is_empty() {
            return Err(CliError::Config(
                "aws_s3_bucket_name is required when state_enabled is set".to_string(),
            ));
        }
        Ok(())
    }
}
