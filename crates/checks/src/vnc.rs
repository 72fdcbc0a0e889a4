//! VNC check: verifies that a server accepts a TCP connection and completes
//! its authentication handshake. Pass/fail is purely connectivity plus auth;
//! there is no content stage.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::net::TcpStream;
use tracing::debug;

use crate::check::Check;
use crate::error::ValidationError;
use crate::runner::race_deadline;
use crate::types::{CheckConfig, CheckResult};

pub const CHECK_TYPE: &str = "vnc";

/// RFB handshake and password authentication on an established connection.
#[async_trait]
pub trait VncHandshake: Send + Sync {
    async fn authenticate(&self, stream: TcpStream, password: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, Deserialize)]
struct VncDefinition {
    /// (required) IP or hostname of the vnc server.
    #[serde(default)]
    host: String,
    /// (required) Port for the vnc server.
    #[serde(default)]
    port: String,
    /// (required) Password for the vnc server.
    #[serde(default)]
    password: String,
}

/// Checks that a VNC server completes its authentication handshake.
pub struct VncCheck {
    config: CheckConfig,
    definition: VncDefinition,
    handshake: Arc<dyn VncHandshake>,
}

impl VncCheck {
    /// Create an uninitialized check that authenticates through `handshake`.
    pub fn new(handshake: Arc<dyn VncHandshake>) -> Self {
        Self {
            config: CheckConfig::default(),
            definition: VncDefinition::default(),
            handshake,
        }
    }
}

#[async_trait]
impl Check for VncCheck {
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
            ("port", &self.definition.port),
            ("password", &self.definition.password),
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
        let probe = probe(Arc::clone(&self.handshake), self.definition.clone());

        race_deadline(result, time_limit, probe).await
    }

    fn config(&self) -> &CheckConfig {
        &self.config
    }
}

async fn probe(
    handshake: Arc<dyn VncHandshake>,
    definition: VncDefinition,
) -> anyhow::Result<String> {
    let addr = format!("{}:{}", definition.host, definition.port);
    debug!("dialing vnc server at {addr}");

    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("connection to vnc host {} failed", definition.host))?;

    handshake
        .authenticate(stream, &definition.password)
        .await
        .with_context(|| format!("login to server {} failed", definition.host))?;

    Ok(format!("vnc handshake with {addr} completed"))
}
