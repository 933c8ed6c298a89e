use async_trait::async_trait;
use rmq_core::{HarnessResult, Manifest};

#[async_trait]
/// Trait contract for the deployment orchestrator the harness drives.
///
/// `deploy` blocks until the orchestrator reports the deployment finished and
/// fails with `HarnessError::Deployment` when it was rejected or errored.
pub trait Orchestrator: Send + Sync {
    async fn current_manifest(&self) -> HarnessResult<Manifest>;

    async fn deploy(&self, manifest: &Manifest) -> HarnessResult<()>;
}
