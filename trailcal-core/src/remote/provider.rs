//! Provider subprocess protocol.
//!
//! This module handles communication with external provider binaries
//! (e.g., `trailcal-provider-google`) using JSON over stdin/stdout.
//!
//! The protocol is designed to be language-agnostic: any executable
//! that speaks the JSON protocol can be a provider.
//!
//! Providers manage their own credentials and tokens. Core just passes
//! provider-specific parameters from the remote config.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{StoreError, StoreResult, TrailcalError, TrailcalResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("trailcal-provider-{}", self.0)
    }

    /// Locate the provider binary on PATH.
    pub fn binary_path(&self) -> TrailcalResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| TrailcalError::ProviderNotInstalled {
            name: self.0.clone(),
            binary: binary_name.clone(),
        })
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type,
    /// ensuring compile-time type safety.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> StoreResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!(
                    "provider request timed out after {}s",
                    PROVIDER_TIMEOUT.as_secs()
                ))
            })?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> StoreResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| StoreError::Rejected(format!("could not encode request: {e}")))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| StoreError::Rejected(format!("could not encode request: {e}")))?;

        let binary_path = self
            .binary_path()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::debug!(provider = %self.0, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "failed to spawn {}: {}",
                    binary_path.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StoreError::Unavailable("provider stdin was not piped".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to write request: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StoreError::Unavailable(format!("provider did not finish: {e}")))?;

        if !output.status.success() {
            return Err(StoreError::Unavailable(format!(
                "provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(StoreError::Unavailable(
                "provider returned no response".into(),
            ));
        }

        let response: Response<R> = serde_json::from_str(&response_str).map_err(|e| {
            StoreError::Unavailable(format!("failed to parse provider response: {e}"))
        })?;

        response.into_result()
    }
}
