use std::fmt;
use std::sync::Arc;

use rmq_core::{HarnessResult, Manifest};

use crate::expectation::Expectation;
use crate::probe::Probe;

type MutationFn = dyn Fn(&mut Manifest) -> HarnessResult<()> + Send + Sync;

#[derive(Clone)]
/// Named in-place edit of a manifest.
pub struct Mutation {
    description: String,
    apply: Arc<MutationFn>,
}

impl Mutation {
    pub fn new<F>(description: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut Manifest) -> HarnessResult<()> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn apply(&self, manifest: &mut Manifest) -> HarnessResult<()> {
        (self.apply)(manifest)
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
/// One probe and every expectation evaluated against its evidence.
pub struct Check {
    pub name: String,
    pub probe: Probe,
    pub expectations: Vec<Expectation>,
}

impl Check {
    pub fn new(name: impl Into<String>, probe: Probe) -> Self {
        Self {
            name: name.into(),
            probe,
            expectations: Vec::new(),
        }
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

#[derive(Debug, Clone)]
/// Optional mutation plus the checks run against the state it produces.
///
/// A stage's mutation is applied on top of whatever the previous stage
/// deployed.
pub struct Stage {
    pub name: String,
    pub mutation: Option<Mutation>,
    pub checks: Vec<Check>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mutation: None,
            checks: Vec::new(),
        }
    }

    pub fn mutate(mut self, mutation: Mutation) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn check_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.checks.len()).sum()
    }
}
