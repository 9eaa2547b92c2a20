//! SSH-scan fallback seam

use async_trait::async_trait;
use infraroute_core::{InfrarouteError, RouterConfig, SshScanRequest, TimeoutConfig};
use infraroute_types::Row;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::connectors::rows_from_json;

/// Executes the SSH-scan request when no source can answer.
///
/// Results have the same shape as a connector query, and failures are
/// reported the same way.
#[async_trait]
pub trait FallbackExecutor: Send + Sync {
    async fn execute(&self, request: &SshScanRequest) -> Result<Vec<Row>, InfrarouteError>;
}

/// Runs an external scanner: request JSON on stdin, JSON rows on stdout
pub struct CommandFallback {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandFallback {
    pub fn new(argv: &[String], timeout: Duration) -> Result<Self, InfrarouteError> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            InfrarouteError::Config("router.fallback_command must not be empty".to_string())
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }
}

#[async_trait]
impl FallbackExecutor for CommandFallback {
    async fn execute(&self, request: &SshScanRequest) -> Result<Vec<Row>, InfrarouteError> {
        let payload = serde_json::to_vec(request)?;
        info!(program = %self.program, intent = %request.intent, "Running SSH scan fallback");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                InfrarouteError::QueryFailed(format!("failed to start '{}': {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The scanner may exit without reading its input
            if let Err(e) = stdin.write_all(&payload).await {
                debug!("Fallback stdin closed early: {}", e);
            }
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| InfrarouteError::Timeout(self.timeout.as_secs(), "SSH scan".to_string()))?
            .map_err(|e| InfrarouteError::QueryFailed(format!("SSH scan failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InfrarouteError::QueryFailed(format!(
                "SSH scan exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            InfrarouteError::QueryFailed(format!("SSH scan returned invalid JSON: {}", e))
        })?;
        rows_from_json(value)
    }
}

/// Used when no scanner is configured
#[derive(Debug, Default)]
pub struct UnavailableFallback;

#[async_trait]
impl FallbackExecutor for UnavailableFallback {
    async fn execute(&self, request: &SshScanRequest) -> Result<Vec<Row>, InfrarouteError> {
        Err(InfrarouteError::FallbackUnavailable(format!(
            "no SSH scan command configured for {} query",
            request.intent
        )))
    }
}

/// The configured fallback: a command when `router.fallback_command` is
/// set, otherwise one that always reports itself unavailable
pub fn fallback_from_config(
    router: &RouterConfig,
    timeouts: &TimeoutConfig,
) -> Result<Arc<dyn FallbackExecutor>, InfrarouteError> {
    if router.fallback_command.is_empty() {
        Ok(Arc::new(UnavailableFallback))
    } else {
        Ok(Arc::new(CommandFallback::new(
            &router.fallback_command,
            timeouts.query(),
        )?))
    }
}
