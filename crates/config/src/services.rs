use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A reconciliation service the backend exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliatorConfig {
    pub id: String,
    pub name: String,
    /// Prefix the service puts in front of entity ids (e.g. `wd`)
    pub prefix: String,
    /// Base URI of the knowledge base entities
    #[serde(default)]
    pub uri: String,
    pub relative_url: String,
    /// Metadata fields worth showing for candidates of this service
    #[serde(default)]
    pub meta_to_viz: Vec<String>,
}

/// An extension service that derives new columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtenderConfig {
    pub id: String,
    pub service_key: String,
    pub name: String,
    pub relative_url: String,
    #[serde(default)]
    pub description: String,
}

/// Registry of the services available to the current deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub reconciliators: Vec<ReconciliatorConfig>,
    pub extenders: Vec<ExtenderConfig>,
}

impl ServicesConfig {
    pub fn reconciliator(&self, id: &str) -> Option<&ReconciliatorConfig> {
        self.reconciliators.iter().find(|r| r.id == id)
    }

    pub fn reconciliator_by_prefix(&self, prefix: &str) -> Option<&ReconciliatorConfig> {
        self.reconciliators.iter().find(|r| r.prefix == prefix)
    }

    pub fn extender(&self, id: &str) -> Option<&ExtenderConfig> {
        self.extenders.iter().find(|e| e.id == id)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for r in &self.reconciliators {
            if !seen.insert(r.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate reconciliator id '{}'",
                    r.id
                )));
            }
        }
        let mut seen = HashSet::new();
        for e in &self.extenders {
            if !seen.insert(e.id.as_str()) {
                return Err(ConfigError::Validation(format!("duplicate extender id '{}'", e.id)));
            }
        }
        Ok(())
    }
}
