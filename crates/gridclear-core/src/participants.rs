//! Generators, demands and the node → participant index.

use crate::error::{CaseError, CaseResult};
use crate::topology::NetworkTopology;
use crate::units::{Megawatts, PricePerMwh};
use crate::{DemandId, GeneratorId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A supply offer located at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: GeneratorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "node")]
    pub location: NodeId,
    /// Must-run floor; zero unless the unit cannot be switched off
    #[serde(default)]
    pub min_output: Megawatts,
    pub max_output: Megawatts,
    pub offer_price: PricePerMwh,
}

impl Generator {
    pub fn new(id: GeneratorId, location: NodeId, max_output: f64, offer_price: f64) -> Self {
        Self {
            id,
            name: None,
            location,
            min_output: Megawatts(0.0),
            max_output: Megawatts(max_output),
            offer_price: PricePerMwh(offer_price),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_min_output(mut self, min_output: f64) -> Self {
        self.min_output = Megawatts(min_output);
        self
    }

    /// Display label, falling back to the id.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// A consumption bid located at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub id: DemandId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "node")]
    pub location: NodeId,
    /// Inelastic share that has to be served regardless of price
    #[serde(default)]
    pub min_load: Megawatts,
    pub max_load: Megawatts,
    pub bid_price: PricePerMwh,
}

impl Demand {
    pub fn new(id: DemandId, location: NodeId, max_load: f64, bid_price: f64) -> Self {
        Self {
            id,
            name: None,
            location,
            min_load: Megawatts(0.0),
            max_load: Megawatts(max_load),
            bid_price: PricePerMwh(bid_price),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_min_load(mut self, min_load: f64) -> Self {
        self.min_load = Megawatts(min_load);
        self
    }

    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Participants in registration order plus a per-node index into them.
///
/// Index entries are positions in [`generators`](Self::generators) /
/// [`demands`](Self::demands), not participant ids.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    generators: Vec<Generator>,
    demands: Vec<Demand>,
    generators_by_node: Vec<Vec<usize>>,
    demands_by_node: Vec<Vec<usize>>,
}

impl ParticipantRegistry {
    pub fn new(
        topology: &NetworkTopology,
        generators: Vec<Generator>,
        demands: Vec<Demand>,
    ) -> CaseResult<Self> {
        let mut seen = HashSet::new();
        for gen in &generators {
            if !seen.insert(gen.id) {
                return Err(CaseError::InvalidParticipant(format!(
                    "duplicate generator id {}",
                    gen.id
                )));
            }
            check_location(topology, gen.location, &gen.label())?;
            check_bounds(&gen.label(), gen.min_output, gen.max_output)?;
            check_price(&gen.label(), gen.offer_price)?;
        }

        let mut seen = HashSet::new();
        for demand in &demands {
            if !seen.insert(demand.id) {
                return Err(CaseError::InvalidParticipant(format!(
                    "duplicate demand id {}",
                    demand.id
                )));
            }
            check_location(topology, demand.location, &demand.label())?;
            check_bounds(&demand.label(), demand.min_load, demand.max_load)?;
            check_price(&demand.label(), demand.bid_price)?;
        }

        let mut generators_by_node = vec![Vec::new(); topology.node_count()];
        for (idx, gen) in generators.iter().enumerate() {
            generators_by_node[gen.location.value()].push(idx);
        }
        let mut demands_by_node = vec![Vec::new(); topology.node_count()];
        for (idx, demand) in demands.iter().enumerate() {
            demands_by_node[demand.location.value()].push(idx);
        }

        Ok(Self {
            generators,
            demands,
            generators_by_node,
            demands_by_node,
        })
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    /// Positions of the generators located at `node`.
    pub fn generators_at(&self, node: NodeId) -> &[usize] {
        self.generators_by_node
            .get(node.value())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Positions of the demands located at `node`.
    pub fn demands_at(&self, node: NodeId) -> &[usize] {
        self.demands_by_node
            .get(node.value())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_generation_capacity(&self) -> Megawatts {
        self.generators.iter().map(|g| g.max_output).sum()
    }

    pub fn total_demand_capacity(&self) -> Megawatts {
        self.demands.iter().map(|d| d.max_load).sum()
    }
}

fn check_location(topology: &NetworkTopology, node: NodeId, label: &str) -> CaseResult<()> {
    if topology.contains(node) {
        Ok(())
    } else {
        Err(CaseError::InvalidParticipant(format!(
            "{label} is located at {node}, but the network has {} nodes",
            topology.node_count()
        )))
    }
}

fn check_bounds(label: &str, min: Megawatts, max: Megawatts) -> CaseResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(CaseError::InvalidParticipant(format!(
            "{label} has non-finite quantity bounds"
        )));
    }
    if max.value() < 0.0 {
        return Err(CaseError::InvalidParticipant(format!(
            "{label} has negative maximum {max}"
        )));
    }
    if min.value() < 0.0 || min.value() > max.value() {
        return Err(CaseError::InvalidParticipant(format!(
            "{label} has minimum {min} outside [0, {max}]"
        )));
    }
    Ok(())
}

fn check_price(label: &str, price: PricePerMwh) -> CaseResult<()> {
    if price.is_finite() {
        Ok(())
    } else {
        Err(CaseError::InvalidParticipant(format!(
            "{label} has a non-finite price"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topo() -> NetworkTopology {
        NetworkTopology::uniform(3, 100.0, 500.0).unwrap()
    }

    #[test]
    fn test_index_groups_participants_by_node() {
        let registry = ParticipantRegistry::new(
            &topo(),
            vec![
                Generator::new(GeneratorId::new(0), NodeId::new(0), 100.0, 12.0),
                Generator::new(GeneratorId::new(1), NodeId::new(1), 80.0, 20.0),
                Generator::new(GeneratorId::new(2), NodeId::new(0), 10.0, 50.0),
            ],
            vec![Demand::new(DemandId::new(0), NodeId::new(1), 100.0, 40.0)],
        )
        .unwrap();

        assert_eq!(registry.generators_at(NodeId::new(0)), &[0, 2]);
        assert_eq!(registry.generators_at(NodeId::new(1)), &[1]);
        assert!(registry.generators_at(NodeId::new(2)).is_empty());
        assert_eq!(registry.demands_at(NodeId::new(1)), &[0]);
        assert!(registry.demands_at(NodeId::new(7)).is_empty());
        assert_eq!(registry.total_generation_capacity(), Megawatts(190.0));
    }

    #[test]
    fn test_rejects_negative_max_output() {
        let err = ParticipantRegistry::new(
            &topo(),
            vec![Generator::new(GeneratorId::new(0), NodeId::new(0), -1.0, 12.0)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CaseError::InvalidParticipant(_)));
    }

    #[test]
    fn test_rejects_negative_max_load() {
        let err = ParticipantRegistry::new(
            &topo(),
            vec![],
            vec![Demand::new(DemandId::new(0), NodeId::new(0), -10.0, 40.0)],
        )
        .unwrap_err();
        assert!(matches!(err, CaseError::InvalidParticipant(_)));
    }

    #[test]
    fn test_rejects_unknown_location() {
        let err = ParticipantRegistry::new(
            &topo(),
            vec![],
            vec![Demand::new(DemandId::new(0), NodeId::new(3), 10.0, 40.0)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Node#3"));
    }

    #[test]
    fn test_rejects_min_above_max() {
        let gen = Generator::new(GeneratorId::new(0), NodeId::new(0), 10.0, 5.0).with_min_output(20.0);
        assert!(ParticipantRegistry::new(&topo(), vec![gen], vec![]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let gens = vec![
            Generator::new(GeneratorId::new(4), NodeId::new(0), 10.0, 5.0),
            Generator::new(GeneratorId::new(4), NodeId::new(1), 10.0, 5.0),
        ];
        assert!(ParticipantRegistry::new(&topo(), gens, vec![]).is_err());
    }

    #[test]
    fn test_rejects_non_finite_price() {
        let demand = Demand::new(DemandId::new(0), NodeId::new(0), 10.0, f64::INFINITY);
        assert!(ParticipantRegistry::new(&topo(), vec![], vec![demand]).is_err());
    }

    #[test]
    fn test_labels_fall_back_to_ids() {
        let named = Generator::new(GeneratorId::new(0), NodeId::new(0), 1.0, 1.0).with_name("coal");
        let unnamed = Demand::new(DemandId::new(2), NodeId::new(0), 1.0, 1.0);
        assert_eq!(named.label(), "coal");
        assert_eq!(unnamed.label(), "Demand#2");
    }
}
