use std::sync::Arc;
use std::time::Instant;

use rmq_core::{HarnessResult, Manifest};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone)]
/// Where a checkout takes the manifest it restores at teardown.
pub enum BaselineSource {
    /// Snapshot the orchestrator's current manifest at checkout time. After a
    /// failed restore the last known-good snapshot is reused instead.
    Current,
    /// Always restore this manifest.
    Pinned(Manifest),
}

#[derive(Debug, Default)]
struct TargetState {
    known_good: Option<Manifest>,
    tainted: bool,
}

#[derive(Clone)]
/// The single deployment target scenarios mutate and restore.
pub struct Deployment {
    orchestrator: Arc<dyn Orchestrator>,
    baseline: BaselineSource,
    gate: Arc<Mutex<TargetState>>,
}

impl Deployment {
    pub fn new(orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            orchestrator,
            baseline: BaselineSource::Current,
            gate: Arc::new(Mutex::new(TargetState::default())),
        }
    }

    pub fn with_baseline(mut self, baseline: BaselineSource) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn orchestrator(&self) -> &Arc<dyn Orchestrator> {
        &self.orchestrator
    }

    /// Takes exclusive hold of the target and captures the baseline.
    ///
    /// Waits for any other outstanding checkout to be released first. While an
    /// earlier checkout left the target unrestored, the last known-good
    /// manifest is used as baseline rather than the left-over state.
    pub async fn checkout(&self) -> HarnessResult<DeploymentCheckout> {
        let mut state = Arc::clone(&self.gate).lock_owned().await;
        let known_good = if state.tainted {
            state.known_good.clone()
        } else {
            None
        };
        let baseline = match (&self.baseline, known_good) {
            (BaselineSource::Pinned(manifest), _) => manifest.clone(),
            (BaselineSource::Current, Some(known_good)) => {
                tracing::warn!(
                    "previous restore did not complete; reusing last known-good baseline"
                );
                known_good
            }
            (BaselineSource::Current, None) => {
                let snapshot = self.orchestrator.current_manifest().await?;
                state.known_good = Some(snapshot.clone());
                snapshot
            }
        };
        tracing::debug!(
            deployment = baseline.name().unwrap_or("<unnamed>"),
            "deployment checked out"
        );
        Ok(DeploymentCheckout {
            orchestrator: Arc::clone(&self.orchestrator),
            baseline,
            deploys: 0,
            dirty: false,
            state,
        })
    }
}

/// Exclusive hold on a deployment for the lifetime of one scenario.
///
/// Deploys go through `&mut self`, so two never overlap. Dropping a checkout
/// whose mutations were not restored logs the left-over state.
pub struct DeploymentCheckout {
    orchestrator: Arc<dyn Orchestrator>,
    baseline: Manifest,
    deploys: usize,
    dirty: bool,
    state: OwnedMutexGuard<TargetState>,
}

impl DeploymentCheckout {
    pub fn baseline(&self) -> &Manifest {
        &self.baseline
    }

    pub fn deploy_count(&self) -> usize {
        self.deploys
    }

    /// True once a mutated manifest was submitted and not yet restored.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub async fn current_manifest(&self) -> HarnessResult<Manifest> {
        self.orchestrator.current_manifest().await
    }

    /// Fetches the current manifest, applies `mutate` in place and deploys it.
    ///
    /// A failing mutation aborts before anything is submitted. Deploy failures
    /// are returned as-is; nothing is retried.
    pub async fn redeploy<F>(&mut self, mutate: F) -> HarnessResult<()>
    where
        F: FnOnce(&mut Manifest) -> HarnessResult<()> + Send,
    {
        let mut manifest = self.orchestrator.current_manifest().await?;
        mutate(&mut manifest)?;
        self.dirty = true;
        self.submit(&manifest, "redeploy").await
    }

    /// Redeploys the baseline unmodified and releases the target.
    pub async fn restore(mut self) -> HarnessResult<()> {
        let baseline = self.baseline.clone();
        self.submit(&baseline, "restore").await?;
        self.dirty = false;
        self.state.tainted = false;
        self.state.known_good = Some(baseline);
        Ok(())
    }

    async fn submit(&mut self, manifest: &Manifest, operation: &'static str) -> HarnessResult<()> {
        self.deploys = self.deploys.saturating_add(1);
        let sequence = self.deploys;
        let started = Instant::now();
        tracing::info!(operation, sequence, "deploy started");
        match self.orchestrator.deploy(manifest).await {
            Ok(()) => {
                tracing::info!(
                    operation,
                    sequence,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "deploy finished"
                );
                Ok(())
            }
            Err(error) => {
                tracing::warn!(operation, sequence, error = %error, "deploy failed");
                Err(error)
            }
        }
    }
}

impl Drop for DeploymentCheckout {
    fn drop(&mut self) {
        if self.dirty {
            self.state.tainted = true;
            tracing::error!(
                deploys = self.deploys,
                "deployment released with mutated state that was not restored; the next checkout restores the last known-good baseline"
            );
        }
    }
}
