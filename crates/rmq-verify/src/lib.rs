//! Declarative scenarios over a redeployable RabbitMQ cluster.
//!
//! A [`Scenario`] is a list of stages; each stage optionally mutates the
//! manifest and then runs checks whose probes collect evidence over remote
//! commands or the management API. [`ScenarioRunner`] drives the
//! `setup → exercise → verify → teardown` lifecycle and always restores the
//! baseline manifest before releasing the deployment.

mod expectation;
mod probe;
mod report;
mod runner;
mod scenario;

pub use expectation::{AssertionMismatch, Evidence, Expectation};
pub use probe::{CredentialSource, EndpointSource, Probe, ProbeEnvironment};
pub use report::{
    CheckReport, CheckStatus, ExpectationReport, PhaseError, ScenarioOutcome, ScenarioPhase,
    ScenarioReport, SuiteReport, TeardownReport,
};
pub use runner::ScenarioRunner;
pub use scenario::{Check, Mutation, Scenario, Stage};
