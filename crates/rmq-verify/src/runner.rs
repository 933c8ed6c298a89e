use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use chrono::Utc;
use futures_util::FutureExt;
use rmq_core::HarnessError;
use rmq_deploy::{Deployment, DeploymentCheckout};

use crate::probe::ProbeEnvironment;
use crate::report::{
    CheckReport, CheckStatus, ExpectationReport, PhaseError, ScenarioOutcome, ScenarioPhase,
    ScenarioReport, SuiteReport, TeardownReport,
};
use crate::scenario::{Check, Scenario, Stage};

/// Runs scenarios one at a time against a shared deployment.
///
/// Every scenario that managed to check the deployment out is restored to
/// its baseline exactly once, whether its stages passed, failed, returned
/// an error or panicked.
pub struct ScenarioRunner {
    deployment: Deployment,
    environment: ProbeEnvironment,
}

#[derive(Default)]
struct Progress {
    phase: Option<ScenarioPhase>,
    stage: Option<String>,
    checks: Vec<CheckReport>,
    errors: Vec<PhaseError>,
}

impl Progress {
    fn enter(&mut self, phase: ScenarioPhase) {
        self.phase = Some(phase);
    }

    fn fail(&mut self, error: &HarnessError) {
        self.errors.push(PhaseError {
            phase: self.phase.unwrap_or(ScenarioPhase::Setup),
            stage: self.stage.clone(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }
}

impl ScenarioRunner {
    pub fn new(deployment: Deployment, environment: ProbeEnvironment) -> Self {
        Self {
            deployment,
            environment,
        }
    }

    pub async fn run_all(&self, scenarios: &[Scenario]) -> SuiteReport {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            reports.push(self.run(scenario).await);
        }
        SuiteReport::new(started_at, reports)
    }

    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        tracing::info!(
            scenario = %scenario.name,
            stages = scenario.stages.len(),
            "scenario started"
        );

        let mut progress = Progress::default();
        progress.enter(ScenarioPhase::Checkout);
        let mut checkout = match self.deployment.checkout().await {
            Ok(checkout) => checkout,
            Err(error) => {
                tracing::error!(
                    scenario = %scenario.name,
                    error = %error,
                    "deployment checkout failed"
                );
                progress.fail(&error);
                return finish(scenario, progress, TeardownReport::Skipped, 0, started);
            }
        };

        let stages = AssertUnwindSafe(self.run_stages(scenario, &mut checkout, &mut progress))
            .catch_unwind()
            .await;
        if let Err(payload) = stages {
            let message = panic_message(payload.as_ref());
            tracing::error!(scenario = %scenario.name, panic = %message, "scenario panicked");
            progress.errors.push(PhaseError {
                phase: progress.phase.unwrap_or(ScenarioPhase::Setup),
                stage: progress.stage.clone(),
                kind: "panic".to_string(),
                message,
            });
        }

        progress.enter(ScenarioPhase::Teardown);
        progress.stage = None;
        let deploys_before_restore = checkout.deploy_count();
        let teardown = match checkout.restore().await {
            Ok(()) => TeardownReport::Restored,
            Err(error) => {
                tracing::error!(
                    scenario = %scenario.name,
                    error = %error,
                    "baseline restore failed; the deployment is left in a mutated state"
                );
                TeardownReport::Failed {
                    message: error.to_string(),
                }
            }
        };
        finish(
            scenario,
            progress,
            teardown,
            deploys_before_restore.saturating_add(1),
            started,
        )
    }

    async fn run_stages(
        &self,
        scenario: &Scenario,
        checkout: &mut DeploymentCheckout,
        progress: &mut Progress,
    ) {
        for stage in &scenario.stages {
            progress.stage = Some(stage.name.clone());
            progress.enter(ScenarioPhase::Setup);
            if let Err(error) = apply_stage_mutation(stage, checkout).await {
                tracing::error!(
                    scenario = %scenario.name,
                    stage = %stage.name,
                    error = %error,
                    "stage setup failed; skipping remaining stages"
                );
                progress.fail(&error);
                return;
            }
            for check in &stage.checks {
                let report = self.run_check(stage, check, checkout, progress).await;
                progress.checks.push(report);
            }
        }
    }

    async fn run_check(
        &self,
        stage: &Stage,
        check: &Check,
        checkout: &DeploymentCheckout,
        progress: &mut Progress,
    ) -> CheckReport {
        let mut report = CheckReport {
            stage: stage.name.clone(),
            name: check.name.clone(),
            probe: check.probe.to_string(),
            status: CheckStatus::Passed,
            expectations: Vec::with_capacity(check.expectations.len()),
            error: None,
        };

        progress.enter(ScenarioPhase::Exercise);
        let evidence = match self.environment.collect(&check.probe, checkout).await {
            Ok(evidence) => evidence,
            Err(error) => {
                tracing::warn!(check = %check.name, error = %error, "evidence collection failed");
                report.status = CheckStatus::Errored;
                report.error = Some(format!("{}: {error}", error.kind()));
                return report;
            }
        };

        progress.enter(ScenarioPhase::Verify);
        for expectation in &check.expectations {
            let mismatch = expectation.evaluate(&evidence).err();
            if let Some(mismatch) = &mismatch {
                tracing::warn!(check = %check.name, mismatch = %mismatch, "expectation not met");
                report.status = CheckStatus::Failed;
            }
            report.expectations.push(ExpectationReport {
                expectation: expectation.describe(),
                mismatch,
            });
        }
        tracing::debug!(check = %check.name, status = ?report.status, "check evaluated");
        report
    }
}

async fn apply_stage_mutation(
    stage: &Stage,
    checkout: &mut DeploymentCheckout,
) -> Result<(), HarnessError> {
    let Some(mutation) = &stage.mutation else {
        return Ok(());
    };
    tracing::info!(stage = %stage.name, mutation = mutation.description(), "applying mutation");
    checkout
        .redeploy(|manifest| mutation.apply(manifest))
        .await
}

fn finish(
    scenario: &Scenario,
    progress: Progress,
    teardown: TeardownReport,
    deploys: usize,
    started: Instant,
) -> ScenarioReport {
    let outcome = ScenarioReport::derive_outcome(&progress.checks, &progress.errors, &teardown);
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        ScenarioOutcome::Passed => {
            tracing::info!(scenario = %scenario.name, elapsed_ms, "scenario passed")
        }
        ScenarioOutcome::Failed => {
            tracing::warn!(scenario = %scenario.name, elapsed_ms, "scenario failed")
        }
        ScenarioOutcome::Errored => {
            tracing::error!(scenario = %scenario.name, elapsed_ms, "scenario errored")
        }
    }
    ScenarioReport {
        name: scenario.name.clone(),
        outcome,
        checks: progress.checks,
        errors: progress.errors,
        teardown,
        deploys,
        elapsed_ms,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}
