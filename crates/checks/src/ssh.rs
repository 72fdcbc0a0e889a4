//! SSH check: verifies that a server accepts a password login and runs a
//! command, optionally matching the command output against a regex.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::check::Check;
use crate::error::ValidationError;
use crate::runner::race_deadline;
use crate::types::{CheckConfig, CheckResult};

pub const CHECK_TYPE: &str = "ssh";

/// Fixed dial budget for the transport connect, kept below any practical
/// overall time limit.
const DIAL_TIMEOUT: Duration = Duration::from_secs(20);

/// Client-side SSH transport capability.
///
/// Implementations authenticate with username/password only and do not
/// verify host keys: the probe measures availability of the service, not the
/// trustworthiness of the peer.
#[async_trait]
pub trait SshTransport: Send + Sync {
    async fn connect(
        &self,
        addr: &str,
        username: &str,
        password: &str,
        dial_timeout: Duration,
    ) -> anyhow::Result<Box<dyn SshConnection>>;
}

/// An authenticated SSH connection able to open exec sessions.
#[async_trait]
pub trait SshConnection: Send {
    async fn open_session(&mut self) -> anyhow::Result<Box<dyn SshSession>>;
}

/// One exec session on an SSH connection.
#[async_trait]
pub trait SshSession: Send {
    /// Run `command`, capturing interleaved stdout and stderr.
    async fn combined_output(&mut self, command: &str) -> anyhow::Result<Vec<u8>>;
}

fn default_port() -> String {
    "22".to_string()
}

fn default_content_regex() -> String {
    ".*".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SshDefinition {
    /// (required) IP or hostname to probe.
    #[serde(default)]
    host: String,
    /// (required) User to log in as.
    #[serde(default)]
    username: String,
    /// (required) Password for that user.
    #[serde(default)]
    password: String,
    /// (required) Command to execute once connected.
    #[serde(default)]
    cmd: String,
    /// (optional, default false) Whether to match the command output.
    #[serde(default)]
    match_content: bool,
    /// (optional, default ".*") Regex the output must match.
    #[serde(default = "default_content_regex")]
    content_regex: String,
    /// (optional, default "22") Port to connect on.
    #[serde(default = "default_port")]
    port: String,
}

/// Checks that an SSH server accepts a login and runs a command.
pub struct SshCheck {
    config: CheckConfig,
    definition: SshDefinition,
    transport: Arc<dyn SshTransport>,
}

impl SshCheck {
    /// Create an uninitialized check that probes through `transport`.
    pub fn new(transport: Arc<dyn SshTransport>) -> Self {
        Self {
            config: CheckConfig::default(),
            definition: SshDefinition::default(),
            transport,
        }
    }
}

#[async_trait]
impl Check for SshCheck {
    fn init(
        &mut self,
        config: CheckConfig,
        definition: &serde_json::Value,
    ) -> Result<(), ValidationError> {
        self.definition = serde_json::from_value(definition.clone()).map_err(|source| {
            ValidationError::Malformed { id: config.id.clone(), check_type: CHECK_TYPE, source }
        })?;
        self.config = config;

        let required = [
            ("host", &self.definition.host),
            ("username", &self.definition.username),
            ("password", &self.definition.password),
            ("cmd", &self.definition.cmd),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ValidationError::MissingField {
                    id: self.config.id.clone(),
                    check_type: CHECK_TYPE,
                    field,
                });
            }
        }

        Ok(())
    }

    async fn run(&self, time_limit: Duration) -> CheckResult {
        let result = CheckResult::new(&self.config, CHECK_TYPE);
        let probe = probe(Arc::clone(&self.transport), self.definition.clone());

        race_deadline(result, time_limit, probe).await
    }

    fn config(&self) -> &CheckConfig {
        &self.config
    }
}

async fn probe(
    transport: Arc<dyn SshTransport>,
    definition: SshDefinition,
) -> anyhow::Result<String> {
    let addr = format!("{}:{}", definition.host, definition.port);
    debug!("dialing ssh server at {addr}");

    let mut connection = transport
        .connect(&addr, &definition.username, &definition.password, DIAL_TIMEOUT)
        .await
        .context("error creating ssh client")?;

    let mut session = connection.open_session().await.context("error creating a ssh session")?;

    let output = session
        .combined_output(&definition.cmd)
        .await
        .with_context(|| format!("error executing command {}", definition.cmd))?;

    if !definition.match_content {
        return Ok(format!(
            "command {} executed successfully: {}",
            definition.cmd,
            String::from_utf8_lossy(&output)
        ));
    }

    let regex = regex::bytes::Regex::new(&definition.content_regex)
        .with_context(|| format!("error compiling regex string {}", definition.content_regex))?;

    if !regex.is_match(&output) {
        anyhow::bail!("matching content not found");
    }

    Ok(format!("command output matched {}", definition.content_regex))
}
