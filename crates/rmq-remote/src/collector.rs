use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rmq_core::HarnessResult;

use crate::result::{extract_stdout, RemoteResult};
use crate::selector::InstanceSelector;

#[async_trait]
/// Trait contract for running a shell command on a deployed instance.
pub trait RemoteTransport: Send + Sync {
    async fn run(&self, instance: &InstanceSelector, command: &str) -> HarnessResult<RemoteResult>;
}

#[derive(Clone)]
/// Collects text evidence from remote instances.
pub struct RemoteEvidenceCollector {
    transport: Arc<dyn RemoteTransport>,
}

impl RemoteEvidenceCollector {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        Self { transport }
    }

    pub async fn run_remote(
        &self,
        instance: &InstanceSelector,
        command: &str,
    ) -> HarnessResult<RemoteResult> {
        let started = Instant::now();
        let result = self.transport.run(instance, command).await;
        match &result {
            Ok(_) => tracing::debug!(
                instance = %instance,
                command,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "remote command completed"
            ),
            Err(error) => tracing::warn!(
                instance = %instance,
                command,
                error = %error,
                "remote command failed"
            ),
        }
        result
    }

    /// Runs `command` and returns the first row's stdout.
    pub async fn collect_stdout(
        &self,
        instance: &InstanceSelector,
        command: &str,
    ) -> HarnessResult<String> {
        let result = self.run_remote(instance, command).await?;
        if let Some(code) = result.first_row().ok().and_then(|row| row.exit_code()) {
            if code != 0 {
                tracing::warn!(
                    instance = %instance,
                    command,
                    exit_code = code,
                    "remote command exited non-zero"
                );
            }
        }
        extract_stdout(&result)
    }
}
