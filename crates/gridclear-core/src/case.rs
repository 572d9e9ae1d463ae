//! Serializable market case input.
//!
//! A case is the deserialized form of everything a clearing run needs:
//! network matrices, participant lists and an optional reference node.
//! JSON and TOML are both accepted; the format is picked from the file
//! extension.

use crate::error::{CaseError, CaseResult};
use crate::participants::{Demand, Generator, ParticipantRegistry};
use crate::topology::NetworkTopology;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Raw case data prior to validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub node_count: usize,
    pub capacity: Vec<Vec<f64>>,
    pub susceptance: Vec<Vec<f64>>,
    #[serde(default)]
    pub generators: Vec<Generator>,
    #[serde(default)]
    pub demands: Vec<Demand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_node: Option<NodeId>,
}

impl MarketCase {
    /// Read a case from a `.json` or `.toml` file.
    pub fn from_path(path: impl AsRef<Path>) -> CaseResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&text),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            other => Err(CaseError::Parse(format!(
                "unsupported case format {:?} for {}; expected .json or .toml",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn from_json_str(text: &str) -> CaseResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> CaseResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Validate into a topology and a participant registry.
    pub fn into_parts(self) -> CaseResult<(NetworkTopology, ParticipantRegistry)> {
        let topology = NetworkTopology::new(self.node_count, self.capacity, self.susceptance)?;
        if let Some(reference) = self.reference_node {
            if !topology.contains(reference) {
                return Err(CaseError::InvalidTopology(format!(
                    "reference node {reference} is outside the network"
                )));
            }
        }
        let registry = ParticipantRegistry::new(&topology, self.generators, self.demands)?;
        Ok((topology, registry))
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed case")
    }
}
