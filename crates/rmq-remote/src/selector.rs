use std::fmt;
use std::str::FromStr;

use rmq_core::HarnessError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Names one instance of an instance group, `group/index` or `group/uuid`.
pub struct InstanceSelector {
    pub group: String,
    pub id: String,
}

impl InstanceSelector {
    pub fn new(group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for InstanceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.id)
    }
}

impl FromStr for InstanceSelector {
    type Err = HarnessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let Some((group, id)) = trimmed.split_once('/') else {
            return Err(HarnessError::InvalidInput(format!(
                "invalid instance selector '{trimmed}'; expected <group>/<index-or-id>"
            )));
        };
        if group.is_empty() || id.is_empty() || id.contains('/') {
            return Err(HarnessError::InvalidInput(format!(
                "invalid instance selector '{trimmed}'; expected <group>/<index-or-id>"
            )));
        }
        Ok(Self::new(group, id))
    }
}

#[cfg(test)]
mod tests {
    use super::InstanceSelector;

    #[test]
    fn unit_parses_group_and_index() {
        let selector: InstanceSelector = "rmq/0".parse().expect("selector");
        assert_eq!(selector, InstanceSelector::new("rmq", "0"));
        assert_eq!(selector.to_string(), "rmq/0");
    }

    #[test]
    fn unit_rejects_malformed_selectors() {
        for raw in ["rmq", "/0", "rmq/", "rmq/0/1", ""] {
            let error = raw
                .parse::<InstanceSelector>()
                .expect_err("selector should be rejected");
            assert!(error.to_string().contains("invalid instance selector"));
        }
    }
}
