use async_trait::async_trait;
use rmq_core::{HarnessError, HarnessResult, Manifest};
use rmq_deploy::Orchestrator;
use rmq_remote::{InstanceSelector, RemoteResult, RemoteTransport};

use crate::process::{run_process, ProcessOutput, RunError};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `BoshCliConfig` used to drive one BOSH deployment.
pub struct BoshCliConfig {
    pub executable: String,
    pub deployment: String,
    /// Global flags placed before every subcommand, e.g. `--environment`.
    pub extra_args: Vec<String>,
    pub deploy_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Orchestrator and remote transport backed by the `bosh` CLI.
pub struct BoshCli {
    config: BoshCliConfig,
}

impl BoshCli {
    pub fn new(config: BoshCliConfig) -> HarnessResult<Self> {
        if config.executable.trim().is_empty() {
            return Err(HarnessError::InvalidInput(
                "bosh executable is empty".to_string(),
            ));
        }
        if config.deployment.trim().is_empty() {
            return Err(HarnessError::InvalidInput(
                "bosh deployment name is empty".to_string(),
            ));
        }
        if config.deploy_timeout_ms == 0 || config.command_timeout_ms == 0 {
            return Err(HarnessError::InvalidInput(
                "bosh timeouts must be greater than 0ms".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &BoshCliConfig {
        &self.config
    }

    fn args<I, S>(&self, subcommand: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = self.config.extra_args.clone();
        args.push("--non-interactive".to_string());
        args.push("--deployment".to_string());
        args.push(self.config.deployment.clone());
        args.extend(subcommand.into_iter().map(Into::into));
        args
    }

    async fn run_bosh(
        &self,
        args: Vec<String>,
        timeout_ms: u64,
    ) -> Result<ProcessOutput, RunError> {
        tracing::debug!(
            executable = %self.config.executable,
            args = ?args,
            "running bosh"
        );
        run_process(&self.config.executable, &args, timeout_ms).await
    }
}

#[async_trait]
impl Orchestrator for BoshCli {
    async fn current_manifest(&self) -> HarnessResult<Manifest> {
        let output = self
            .run_bosh(self.args(["manifest"]), self.config.command_timeout_ms)
            .await
            .map_err(|error| HarnessError::Transport(format!("bosh manifest {error}")))?;
        if !output.success {
            return Err(HarnessError::Transport(format!(
                "bosh manifest failed with status {}: {}",
                output.status,
                output.failure_summary()
            )));
        }
        Manifest::from_yaml_str(&output.stdout)
    }

    async fn deploy(&self, manifest: &Manifest) -> HarnessResult<()> {
        let rendered = manifest.to_yaml_string()?;
        let file = tempfile::Builder::new()
            .prefix("rmq-manifest-")
            .suffix(".yml")
            .tempfile()?;
        tokio::fs::write(file.path(), rendered).await?;

        let path = file.path().display().to_string();
        let output = self
            .run_bosh(self.args(["deploy", path.as_str()]), self.config.deploy_timeout_ms)
            .await
            .map_err(|error| HarnessError::Deployment(format!("bosh deploy {error}")))?;
        if !output.success {
            return Err(HarnessError::Deployment(format!(
                "bosh deploy failed with status {}: {}",
                output.status,
                output.failure_summary()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteTransport for BoshCli {
    async fn run(&self, instance: &InstanceSelector, command: &str) -> HarnessResult<RemoteResult> {
        let target = instance.to_string();
        let args = self.args([
            "ssh",
            target.as_str(),
            "--command",
            command,
            "--results",
            "--json",
        ]);
        let output = self
            .run_bosh(args, self.config.command_timeout_ms)
            .await
            .map_err(|error| HarnessError::Transport(format!("bosh ssh {target} {error}")))?;

        // `bosh ssh --results` exits non-zero when the remote command does,
        // but still prints the result table.
        match RemoteResult::from_json_str(&output.stdout) {
            Ok(result) if !result.tables.is_empty() => Ok(result),
            _ if !output.success => Err(HarnessError::Transport(format!(
                "bosh ssh {target} failed with status {}: {}",
                output.status,
                output.failure_summary()
            ))),
            Ok(result) => Ok(result),
            Err(error) => Err(error),
        }
    }
}
