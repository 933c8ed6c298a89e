use std::fmt;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::mapping_ext::{value_kind, MappingExt};
use crate::{HarnessError, HarnessResult};

const INSTANCE_GROUPS_KEY: &str = "instance_groups";
const JOBS_KEY: &str = "jobs";
const NAME_KEY: &str = "name";
const PROPERTIES_KEY: &str = "properties";

#[derive(Debug, Clone, Default, PartialEq)]
/// Deployment manifest held as a YAML mapping tree.
pub struct Manifest {
    root: Mapping,
}

impl Manifest {
    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    pub fn from_value(value: Value) -> HarnessResult<Self> {
        match value {
            Value::Mapping(root) => Ok(Self { root }),
            other => Err(HarnessError::TypeMismatch {
                path: "<root>".to_string(),
                expected: "mapping",
                found: value_kind(&other),
            }),
        }
    }

    pub fn from_yaml_str(raw: &str) -> HarnessResult<Self> {
        let value: Value = serde_yaml::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn load(path: &Path) -> HarnessResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn to_yaml_string(&self) -> HarnessResult<String> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// Deployment name, when the manifest carries one.
    pub fn name(&self) -> Option<&str> {
        self.root.get(NAME_KEY).and_then(Value::as_str)
    }

    pub fn instance_group_names(&self) -> Vec<&str> {
        self.root
            .get(INSTANCE_GROUPS_KEY)
            .and_then(Value::as_sequence)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|group| group.get(NAME_KEY).and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn properties(&self, selector: &PropertySelector) -> HarnessResult<&Mapping> {
        get_properties(self, &selector.group, &selector.job)
    }

    pub fn properties_mut(&mut self, selector: &PropertySelector) -> HarnessResult<&mut Mapping> {
        get_properties_mut(self, &selector.group, &selector.job)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Locates one job's property mapping inside a manifest.
pub struct PropertySelector {
    pub group: String,
    pub job: String,
}

impl PropertySelector {
    pub fn new(group: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            job: job.into(),
        }
    }
}

impl fmt::Display for PropertySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.job)
    }
}

fn entry_named(entry: &Value, name: &str) -> bool {
    entry.get(NAME_KEY).and_then(Value::as_str) == Some(name)
}

fn find_job<'a>(manifest: &'a Manifest, group: &str, job: &str) -> HarnessResult<&'a Mapping> {
    let groups = manifest.root.require_sequence(INSTANCE_GROUPS_KEY)?;
    let group_map = groups
        .iter()
        .filter(|entry| entry_named(entry, group))
        .find_map(Value::as_mapping)
        .ok_or_else(|| HarnessError::not_found(format!("instance group '{group}'")))?;
    let jobs = group_map
        .require_sequence(JOBS_KEY)
        .map_err(|_| HarnessError::not_found(format!("jobs of instance group '{group}'")))?;
    jobs.iter()
        .filter(|entry| entry_named(entry, job))
        .find_map(Value::as_mapping)
        .ok_or_else(|| {
            HarnessError::not_found(format!("job '{job}' in instance group '{group}'"))
        })
}

fn find_job_mut<'a>(
    manifest: &'a mut Manifest,
    group: &str,
    job: &str,
) -> HarnessResult<&'a mut Mapping> {
    let groups = manifest.root.require_sequence_mut(INSTANCE_GROUPS_KEY)?;
    let group_map = groups
        .iter_mut()
        .filter(|entry| entry_named(entry, group))
        .find_map(Value::as_mapping_mut)
        .ok_or_else(|| HarnessError::not_found(format!("instance group '{group}'")))?;
    let jobs = group_map
        .require_sequence_mut(JOBS_KEY)
        .map_err(|_| HarnessError::not_found(format!("jobs of instance group '{group}'")))?;
    jobs.iter_mut()
        .filter(|entry| entry_named(entry, job))
        .find_map(Value::as_mapping_mut)
        .ok_or_else(|| {
            HarnessError::not_found(format!("job '{job}' in instance group '{group}'"))
        })
}

/// Returns the `properties` mapping of `job` inside instance group `group`.
pub fn get_properties<'a>(
    manifest: &'a Manifest,
    group: &str,
    job: &str,
) -> HarnessResult<&'a Mapping> {
    find_job(manifest, group, job)?
        .require_mapping(PROPERTIES_KEY)
        .map_err(|_| {
            HarnessError::not_found(format!(
                "properties of job '{job}' in instance group '{group}'"
            ))
        })
}

/// Mutable view of a job's `properties`; edits land in `manifest` itself.
///
/// A job without a `properties` key gets an empty mapping inserted so that
/// callers can populate it.
pub fn get_properties_mut<'a>(
    manifest: &'a mut Manifest,
    group: &str,
    job: &str,
) -> HarnessResult<&'a mut Mapping> {
    find_job_mut(manifest, group, job)?.mapping_entry(PROPERTIES_KEY)
}
