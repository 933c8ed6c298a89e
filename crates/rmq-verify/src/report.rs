use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::expectation::AssertionMismatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed,
    /// A check mismatched or could not collect its evidence.
    Failed,
    /// Checkout, setup or teardown failed, or the scenario panicked.
    Errored,
}

impl ScenarioOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioOutcome::Passed => "passed",
            ScenarioOutcome::Failed => "failed",
            ScenarioOutcome::Errored => "errored",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    Checkout,
    Setup,
    Exercise,
    Verify,
    Teardown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Failure that stopped a scenario's stages.
pub struct PhaseError {
    pub phase: ScenarioPhase,
    pub stage: Option<String>,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Evidence could not be collected; no expectation was evaluated.
    Errored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectationReport {
    pub expectation: String,
    pub mismatch: Option<AssertionMismatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub stage: String,
    pub name: String,
    pub probe: String,
    pub status: CheckStatus,
    pub expectations: Vec<ExpectationReport>,
    pub error: Option<String>,
}

impl CheckReport {
    pub fn mismatches(&self) -> impl Iterator<Item = &AssertionMismatch> {
        self.expectations
            .iter()
            .filter_map(|report| report.mismatch.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TeardownReport {
    Restored,
    Failed { message: String },
    /// Nothing was checked out, so there was nothing to restore.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: ScenarioOutcome,
    pub checks: Vec<CheckReport>,
    pub errors: Vec<PhaseError>,
    pub teardown: TeardownReport,
    pub deploys: usize,
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Errored beats failed beats passed.
    pub fn derive_outcome(
        checks: &[CheckReport],
        errors: &[PhaseError],
        teardown: &TeardownReport,
    ) -> ScenarioOutcome {
        if !errors.is_empty() || !matches!(teardown, TeardownReport::Restored) {
            ScenarioOutcome::Errored
        } else if checks
            .iter()
            .any(|check| check.status != CheckStatus::Passed)
        {
            ScenarioOutcome::Failed
        } else {
            ScenarioOutcome::Passed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn new(started_at: DateTime<Utc>, scenarios: Vec<ScenarioReport>) -> Self {
        let count = |outcome: ScenarioOutcome| {
            scenarios
                .iter()
                .filter(|scenario| scenario.outcome == outcome)
                .count()
        };
        Self {
            started_at,
            finished_at: Utc::now(),
            passed: count(ScenarioOutcome::Passed),
            failed: count(ScenarioOutcome::Failed),
            errored: count(ScenarioOutcome::Errored),
            scenarios,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for scenario in &self.scenarios {
            let _ = writeln!(
                out,
                "{:<8} {} ({} checks, {} deploys, {}ms)",
                scenario.outcome.as_str().to_ascii_uppercase(),
                scenario.name,
                scenario.checks.len(),
                scenario.deploys,
                scenario.elapsed_ms
            );
            for check in &scenario.checks {
                let marker = match check.status {
                    CheckStatus::Passed => "ok",
                    CheckStatus::Failed => "FAIL",
                    CheckStatus::Errored => "ERROR",
                };
                let _ = writeln!(
                    out,
                    "  [{marker}] {} / {}: {}",
                    check.stage, check.name, check.probe
                );
                for mismatch in check.mismatches() {
                    let _ = writeln!(out, "      {mismatch}");
                }
                if let Some(error) = &check.error {
                    let _ = writeln!(out, "      {error}");
                }
            }
            for error in &scenario.errors {
                let stage = error.stage.as_deref().unwrap_or("-");
                let _ = writeln!(
                    out,
                    "  {:?} failed in stage {stage} ({}): {}",
                    error.phase, error.kind, error.message
                );
            }
            match &scenario.teardown {
                TeardownReport::Restored => {}
                TeardownReport::Failed { message } => {
                    let _ = writeln!(out, "  teardown failed, cluster left mutated: {message}");
                }
                TeardownReport::Skipped => {
                    let _ = writeln!(out, "  teardown skipped");
                }
            }
        }
        let _ = writeln!(
            out,
            "{} passed, {} failed, {} errored",
            self.passed, self.failed, self.errored
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        CheckReport, CheckStatus, ExpectationReport, PhaseError, ScenarioOutcome, ScenarioPhase,
        ScenarioReport, SuiteReport, TeardownReport,
    };
    use crate::expectation::AssertionMismatch;

    fn check(status: CheckStatus, mismatch: Option<AssertionMismatch>) -> CheckReport {
        CheckReport {
            stage: "properties".to_string(),
            name: "disk free limit".to_string(),
            probe: "ssh rmq/0: rabbitmqctl environment".to_string(),
            status,
            expectations: vec![ExpectationReport {
                expectation: "contains `{disk_free_limit,20000000}`".to_string(),
                mismatch,
            }],
            error: None,
        }
    }

    fn scenario(
        name: &str,
        checks: Vec<CheckReport>,
        errors: Vec<PhaseError>,
        teardown: TeardownReport,
    ) -> ScenarioReport {
        ScenarioReport {
            name: name.to_string(),
            outcome: ScenarioReport::derive_outcome(&checks, &errors, &teardown),
            checks,
            errors,
            teardown,
            deploys: 2,
            elapsed_ms: 10,
        }
    }

    #[test]
    fn unit_outcome_precedence() {
        let passed = check(CheckStatus::Passed, None);
        let failed = check(
            CheckStatus::Failed,
            Some(AssertionMismatch {
                expected: "`{disk_free_limit,20000000}`".to_string(),
                actual: "{disk_free_limit,{mem_relative,0.4}}".to_string(),
            }),
        );
        assert_eq!(
            ScenarioReport::derive_outcome(&[passed.clone()], &[], &TeardownReport::Restored),
            ScenarioOutcome::Passed
        );
        assert_eq!(
            ScenarioReport::derive_outcome(
                &[passed.clone(), failed],
                &[],
                &TeardownReport::Restored
            ),
            ScenarioOutcome::Failed
        );
        assert_eq!(
            ScenarioReport::derive_outcome(
                &[passed.clone()],
                &[],
                &TeardownReport::Failed {
                    message: "deploy rejected".to_string()
                }
            ),
            ScenarioOutcome::Errored
        );
        let setup = PhaseError {
            phase: ScenarioPhase::Setup,
            stage: Some("properties".to_string()),
            kind: "deployment".to_string(),
            message: "deploy rejected".to_string(),
        };
        assert_eq!(
            ScenarioReport::derive_outcome(&[passed], &[setup], &TeardownReport::Restored),
            ScenarioOutcome::Errored
        );
    }

    #[test]
    fn functional_suite_report_counts_and_renders() {
        let mismatch = AssertionMismatch {
            expected: "contains `{disk_free_limit,20000000}`".to_string(),
            actual: "{disk_free_limit,{mem_relative,0.4}}".to_string(),
        };
        let report = SuiteReport::new(
            Utc::now(),
            vec![
                scenario(
                    "defaults",
                    vec![check(CheckStatus::Passed, None)],
                    vec![],
                    TeardownReport::Restored,
                ),
                scenario(
                    "properties",
                    vec![check(CheckStatus::Failed, Some(mismatch))],
                    vec![],
                    TeardownReport::Restored,
                ),
                scenario("cookie", vec![], vec![], TeardownReport::Skipped),
            ],
        );
        assert_eq!((report.passed, report.failed, report.errored), (1, 1, 1));
        assert!(!report.all_passed());

        let text = report.render_text();
        assert!(text.contains("PASSED   defaults"));
        assert!(text.contains("[FAIL] properties / disk free limit"));
        assert!(text.contains("got {disk_free_limit,{mem_relative,0.4}}"));
        assert!(text.contains("teardown skipped"));
        assert!(text.ends_with("1 passed, 1 failed, 1 errored\n"));
    }

    #[test]
    fn unit_report_serializes_with_snake_case_tags() {
        let report = scenario(
            "ssl",
            vec![],
            vec![],
            TeardownReport::Failed {
                message: "timed out".to_string(),
            },
        );
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["outcome"], "errored");
        assert_eq!(json["teardown"]["status"], "failed");
        assert_eq!(json["teardown"]["message"], "timed out");
    }
}
