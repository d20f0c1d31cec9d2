//! Static registry of remotely deployed agents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A remotely deployed agent runtime.
///
/// Loaded once at startup from the `agents` config table and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTarget {
    /// Logical name the model uses to address the agent.
    pub name: String,
    /// Runtime endpoint identifier (e.g. a runtime ARN).
    pub endpoint_id: String,
    /// Shown to the model in the `invoke_agent` tool description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AgentTarget {
    pub fn new(name: &str, endpoint_id: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint_id: endpoint_id.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Name → target lookup that remembers declaration order.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    targets: Vec<AgentTarget>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Build a registry. A later entry with a duplicate name replaces the
    /// earlier one in place.
    ///
    /// # Example
    /// ```
    /// use switchboard::agents::{AgentRegistry, AgentTarget};
    ///
    /// let registry = AgentRegistry::new(vec![
    ///     AgentTarget::new("calculator", "arn:runtime/calculator"),
    ///     AgentTarget::new("researcher", "arn:runtime/researcher"),
    /// ]);
    /// assert_eq!(registry.names(), vec!["calculator", "researcher"]);
    /// assert!(registry.get("calculator").is_some());
    /// ```
    pub fn new(targets: Vec<AgentTarget>) -> Self {
        let mut registry = Self::default();
        for target in targets {
            match registry.index.get(&target.name) {
                Some(&i) => registry.targets[i] = target,
                None => {
                    registry
                        .index
                        .insert(target.name.clone(), registry.targets.len());
                    registry.targets.push(target);
                }
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&AgentTarget> {
        self.index.get(name).map(|&i| &self.targets[i])
    }

    /// Registered names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
