//! Network topology as dense capacity / susceptance matrices.
//!
//! Every ordered node pair `(i, j)` with `i != j` is an edge. A capacity of
//! zero disables the pair but keeps it in the edge set, so downstream model
//! construction still pins its flow to `[0, 0]`.

use crate::error::{CaseError, CaseResult};
use crate::units::Megawatts;
use crate::NodeId;
use petgraph::unionfind::UnionFind;
use std::collections::BTreeMap;
use tracing::warn;

/// Relative tolerance used when checking matrix symmetry.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Attributes of one ordered node pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairAttributes {
    pub from: NodeId,
    pub to: NodeId,
    /// Thermal limit in both directions
    pub capacity: Megawatts,
    /// DC coupling coefficient: flow = susceptance * (angle_from - angle_to)
    pub susceptance: f64,
}

impl PairAttributes {
    /// True when the pair can carry flow at all.
    pub fn is_usable(&self) -> bool {
        self.capacity.value() > 0.0
    }
}

/// Connected group of nodes able to exchange power.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    pub island_id: usize,
    pub nodes: Vec<NodeId>,
}

/// Validated complete-graph topology.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    node_count: usize,
    capacity: Vec<Vec<f64>>,
    susceptance: Vec<Vec<f64>>,
}

impl NetworkTopology {
    /// Build a topology, validating shape, finiteness, symmetry and
    /// capacity non-negativity.
    pub fn new(
        node_count: usize,
        capacity: Vec<Vec<f64>>,
        susceptance: Vec<Vec<f64>>,
    ) -> CaseResult<Self> {
        if node_count == 0 {
            return Err(CaseError::InvalidTopology(
                "network must contain at least one node".into(),
            ));
        }
        check_shape("capacity", &capacity, node_count)?;
        check_shape("susceptance", &susceptance, node_count)?;

        for i in 0..node_count {
            for j in 0..node_count {
                let cap = capacity[i][j];
                let b = susceptance[i][j];
                if !cap.is_finite() || !b.is_finite() {
                    return Err(CaseError::InvalidTopology(format!(
                        "non-finite entry at ({i}, {j})"
                    )));
                }
                if i == j {
                    if cap != 0.0 || b != 0.0 {
                        warn!(node = i, "ignoring non-zero diagonal entry; self flow is not modeled");
                    }
                    continue;
                }
                if cap < 0.0 {
                    return Err(CaseError::InvalidTopology(format!(
                        "capacity[{i}][{j}] = {cap} is negative"
                    )));
                }
                if j > i {
                    if !approx_symmetric(cap, capacity[j][i]) {
                        return Err(CaseError::InvalidTopology(format!(
                            "capacity[{i}][{j}] = {cap} but capacity[{j}][{i}] = {}",
                            capacity[j][i]
                        )));
                    }
                    if !approx_symmetric(b, susceptance[j][i]) {
                        return Err(CaseError::InvalidTopology(format!(
                            "susceptance[{i}][{j}] = {b} but susceptance[{j}][{i}] = {}",
                            susceptance[j][i]
                        )));
                    }
                }
            }
        }

        Ok(Self {
            node_count,
            capacity,
            susceptance,
        })
    }

    /// Fully meshed topology with identical attributes on every pair.
    pub fn uniform(node_count: usize, capacity: f64, susceptance: f64) -> CaseResult<Self> {
        let matrix = |value: f64| -> Vec<Vec<f64>> {
            (0..node_count)
                .map(|i| {
                    (0..node_count)
                        .map(|j| if i == j { 0.0 } else { value })
                        .collect()
                })
                .collect()
        };
        Self::new(node_count, matrix(capacity), matrix(susceptance))
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count).map(NodeId::new)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.value() < self.node_count
    }

    /// Capacity of the pair; zero on the diagonal.
    pub fn capacity(&self, from: NodeId, to: NodeId) -> Megawatts {
        if from == to {
            return Megawatts(0.0);
        }
        Megawatts(self.capacity[from.value()][to.value()])
    }

    /// Susceptance of the pair; zero on the diagonal.
    pub fn susceptance(&self, from: NodeId, to: NodeId) -> f64 {
        if from == to {
            return 0.0;
        }
        self.susceptance[from.value()][to.value()]
    }

    pub fn pair(&self, from: NodeId, to: NodeId) -> PairAttributes {
        PairAttributes {
            from,
            to,
            capacity: self.capacity(from, to),
            susceptance: self.susceptance(from, to),
        }
    }

    /// Every ordered pair `(i, j)` with `i != j`, row-major.
    pub fn ordered_pairs(&self) -> impl Iterator<Item = PairAttributes> + '_ {
        let n = self.node_count;
        (0..n).flat_map(move |i| {
            (0..n)
                .filter(move |&j| j != i)
                .map(move |j| self.pair(NodeId::new(i), NodeId::new(j)))
        })
    }

    /// Pairs leaving `node` that have non-zero capacity.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = PairAttributes> + '_ {
        let n = if self.contains(node) { self.node_count } else { 0 };
        (0..n)
            .map(NodeId::new)
            .filter(move |&other| other != node)
            .map(move |other| self.pair(node, other))
            .filter(PairAttributes::is_usable)
    }

    /// Groups nodes connected through usable pairs with non-zero susceptance.
    ///
    /// Islands are ordered by their smallest node id.
    pub fn islands(&self) -> Vec<Island> {
        let mut sets = UnionFind::<usize>::new(self.node_count);
        for pair in self.ordered_pairs() {
            if pair.from < pair.to && pair.is_usable() && pair.susceptance != 0.0 {
                sets.union(pair.from.value(), pair.to.value());
            }
        }

        let mut grouped: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for (node, root) in sets.into_labeling().into_iter().enumerate() {
            grouped.entry(root).or_default().push(NodeId::new(node));
        }

        let mut islands: Vec<Vec<NodeId>> = grouped.into_values().collect();
        islands.sort_by_key(|nodes| nodes[0]);
        islands
            .into_iter()
            .enumerate()
            .map(|(island_id, nodes)| Island { island_id, nodes })
            .collect()
    }
}

fn check_shape(name: &str, matrix: &[Vec<f64>], node_count: usize) -> CaseResult<()> {
    if matrix.len() != node_count {
        return Err(CaseError::InvalidTopology(format!(
            "{name} matrix has {} rows, expected {node_count}",
            matrix.len()
        )));
    }
    if let Some((row, entries)) = matrix
        .iter()
        .enumerate()
        .find(|(_, entries)| entries.len() != node_count)
    {
        return Err(CaseError::InvalidTopology(format!(
            "{name} row {row} has {} entries, expected {node_count}",
            entries.len()
        )));
    }
    Ok(())
}

fn approx_symmetric(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= SYMMETRY_TOLERANCE * scale
}
