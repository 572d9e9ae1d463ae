//! Welfare-maximizing DC market clearing as a linear program.
//!
//! ## Variables
//!
//! | Name | Count | Bounds |
//! |------|-------|--------|
//! | `generation[g]` | one per generator | `[min_output, max_output]` |
//! | `consumption[d]` | one per demand | `[min_load, max_load]` |
//! | `angle[n]` | one per node | free |
//! | `flow[i,j]` | one per ordered pair `i != j` | `[-cap(i,j), cap(i,j)]` |
//!
//! ## Objective
//!
//! ```text
//! maximize  Σ_d bid[d]·consumption[d] − Σ_g offer[g]·generation[g]
//! ```
//!
//! ## Constraints
//!
//! ```text
//! reference_angle:  angle[ref] = 0
//! dc_flow[i,j]:     flow[i,j] − b(i,j)·(angle[i] − angle[j]) = 0     i != j
//! balance[n]:       Σ_{g@n} generation − Σ_{d@n} consumption − Σ_j flow[n,j] = 0
//! ```
//!
//! A pair with zero capacity still gets a flow variable, pinned to `[0, 0]`.
//! Flow on the diagonal is not a variable and reads as zero.

use crate::error::ClearingResult;
use gridclear_core::{CaseError, NetworkTopology, NodeId, ParticipantRegistry};
use gridclear_solver::{ConstraintId, ConstraintSense, LpProblem, ObjectiveSense, VarId};
use tracing::{debug, warn};

/// Node whose angle is pinned to zero unless the caller picks another.
pub const DEFAULT_REFERENCE_NODE: NodeId = NodeId::new(0);

/// Where every market quantity lives inside the LP.
///
/// Participant vectors are indexed by registry position, node vectors by
/// node index.
#[derive(Debug, Clone)]
pub struct VariableMap {
    pub generation: Vec<VarId>,
    pub consumption: Vec<VarId>,
    pub angle: Vec<VarId>,
    /// Row-major `n × n`, `None` on the diagonal
    flow: Vec<Option<VarId>>,
    pub balance: Vec<ConstraintId>,
    pub reference_angle: ConstraintId,
    node_count: usize,
}

impl VariableMap {
    pub fn flow(&self, from: NodeId, to: NodeId) -> Option<VarId> {
        self.flow
            .get(from.value() * self.node_count + to.value())
            .copied()
            .flatten()
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

/// An LP ready for a backend plus the map needed to read its solution.
#[derive(Debug, Clone)]
pub struct ClearingModel {
    pub problem: LpProblem,
    pub variables: VariableMap,
    pub reference: NodeId,
}

/// Derives the clearing LP from validated topology and participants.
pub struct ModelBuilder<'a> {
    topology: &'a NetworkTopology,
    registry: &'a ParticipantRegistry,
    reference: NodeId,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(topology: &'a NetworkTopology, registry: &'a ParticipantRegistry) -> Self {
        Self {
            topology,
            registry,
            reference: DEFAULT_REFERENCE_NODE,
        }
    }

    pub fn with_reference(mut self, node: NodeId) -> Self {
        self.reference = node;
        self
    }

    pub fn build(&self) -> ClearingResult<ClearingModel> {
        let topology = self.topology;
        let registry = self.registry;
        let n = topology.node_count();

        if !topology.contains(self.reference) {
            return Err(CaseError::InvalidTopology(format!(
                "reference node {} is outside the {n}-node network",
                self.reference
            ))
            .into());
        }

        // a registry validated against another network would drop
        // participants out of every balance row
        let stray = registry
            .generators()
            .iter()
            .map(|g| (g.label(), g.location))
            .chain(registry.demands().iter().map(|d| (d.label(), d.location)))
            .find(|(_, node)| !topology.contains(*node));
        if let Some((label, node)) = stray {
            return Err(CaseError::InvalidParticipant(format!(
                "{label} is located at {node}, outside the {n}-node network"
            ))
            .into());
        }

        let islands = topology.islands();
        if islands.len() > 1 {
            warn!(
                islands = islands.len(),
                reference = %self.reference,
                "network is split; nodes outside the reference island float freely"
            );
        }

        let mut lp = LpProblem::new(ObjectiveSense::Maximize);

        let generation: Vec<VarId> = registry
            .generators()
            .iter()
            .enumerate()
            .map(|(idx, gen)| {
                let var = lp.add_variable(
                    format!("generation[{idx}]"),
                    gen.min_output.value(),
                    gen.max_output.value(),
                );
                lp.add_objective_term(var, -gen.offer_price.value());
                var
            })
            .collect();

        let consumption: Vec<VarId> = registry
            .demands()
            .iter()
            .enumerate()
            .map(|(idx, demand)| {
                let var = lp.add_variable(
                    format!("consumption[{idx}]"),
                    demand.min_load.value(),
                    demand.max_load.value(),
                );
                lp.add_objective_term(var, demand.bid_price.value());
                var
            })
            .collect();

        let angle: Vec<VarId> = topology
            .nodes()
            .map(|node| lp.add_free_variable(format!("angle[{}]", node.value())))
            .collect();

        let mut flow = vec![None; n * n];
        for pair in topology.ordered_pairs() {
            let cap = pair.capacity.value();
            let var = lp.add_variable(
                format!("flow[{},{}]", pair.from.value(), pair.to.value()),
                -cap,
                cap,
            );
            flow[pair.from.value() * n + pair.to.value()] = Some(var);
        }

        let reference_angle = lp.add_constraint(
            format!("reference_angle[{}]", self.reference.value()),
            vec![(angle[self.reference.value()], 1.0)],
            ConstraintSense::Equal,
            0.0,
        );

        for pair in topology.ordered_pairs() {
            let (i, j) = (pair.from.value(), pair.to.value());
            let Some(flow_var) = flow[i * n + j] else {
                continue;
            };
            let b = pair.susceptance;
            lp.add_constraint(
                format!("dc_flow[{i},{j}]"),
                vec![(flow_var, 1.0), (angle[i], -b), (angle[j], b)],
                ConstraintSense::Equal,
                0.0,
            );
        }

        let balance: Vec<ConstraintId> = topology
            .nodes()
            .map(|node| {
                let mut terms = Vec::new();
                terms.extend(registry.generators_at(node).iter().map(|&g| (generation[g], 1.0)));
                terms.extend(registry.demands_at(node).iter().map(|&d| (consumption[d], -1.0)));
                terms.extend(
                    topology
                        .nodes()
                        .filter_map(|other| flow[node.value() * n + other.value()])
                        .map(|var| (var, -1.0)),
                );
                lp.add_constraint(
                    format!("balance[{}]", node.value()),
                    terms,
                    ConstraintSense::Equal,
                    0.0,
                )
            })
            .collect();

        debug!(
            nodes = n,
            generators = generation.len(),
            demands = consumption.len(),
            vars = lp.num_vars(),
            constraints = lp.num_constraints(),
            "built clearing model"
        );

        Ok(ClearingModel {
            problem: lp,
            variables: VariableMap {
                generation,
                consumption,
                angle,
                flow,
                balance,
                reference_angle,
                node_count: n,
            },
            reference: self.reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridclear_core::{Demand, DemandId, Generator, GeneratorId};

    fn scenario() -> (NetworkTopology, ParticipantRegistry) {
        let topology = NetworkTopology::uniform(3, 100.0, 500.0).unwrap();
        let registry = ParticipantRegistry::new(
            &topology,
            vec![
                Generator::new(GeneratorId::new(0), NodeId::new(0), 100.0, 12.0),
                Generator::new(GeneratorId::new(1), NodeId::new(1), 80.0, 20.0),
            ],
            vec![
                Demand::new(DemandId::new(0), NodeId::new(1), 100.0, 40.0),
                Demand::new(DemandId::new(1), NodeId::new(2), 50.0, 35.0),
            ],
        )
        .unwrap();
        (topology, registry)
    }

    #[test]
    fn test_model_dimensions() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();

        // 2 gen + 2 demand + 3 angles + 6 ordered flows
        assert_eq!(model.problem.num_vars(), 13);
        // 1 reference + 6 dc + 3 balance
        assert_eq!(model.problem.num_constraints(), 10);
        assert_eq!(model.problem.sense(), ObjectiveSense::Maximize);
        assert_eq!(model.reference, DEFAULT_REFERENCE_NODE);
    }

    #[test]
    fn test_objective_signs() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let vars = &model.variables;
        let objective = model.problem.objective();

        assert_eq!(objective[vars.generation[0].index()], -12.0);
        assert_eq!(objective[vars.consumption[1].index()], 35.0);
        assert_eq!(objective[vars.angle[2].index()], 0.0);
    }

    #[test]
    fn test_flow_bounds_and_diagonal() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let vars = &model.variables;

        assert!(vars.flow(NodeId::new(1), NodeId::new(1)).is_none());
        let f = vars.flow(NodeId::new(0), NodeId::new(2)).unwrap();
        let def = model.problem.variable(f);
        assert_eq!((def.lower, def.upper), (-100.0, 100.0));
        assert_eq!(def.name, "flow[0,2]");
    }

    #[test]
    fn test_zero_capacity_pins_flow() {
        let topology = NetworkTopology::new(
            2,
            vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            vec![vec![0.0, 10.0], vec![10.0, 0.0]],
        )
        .unwrap();
        let registry = ParticipantRegistry::new(&topology, vec![], vec![]).unwrap();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();

        let f = model.variables.flow(NodeId::new(0), NodeId::new(1)).unwrap();
        assert!(model.problem.variable(f).is_fixed());
    }

    #[test]
    fn test_balance_row_terms() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let vars = &model.variables;
        let row = model.problem.constraint(vars.balance[1]);

        assert_eq!(row.name, "balance[1]");
        assert!(row.terms.contains(&(vars.generation[1], 1.0)));
        assert!(row.terms.contains(&(vars.consumption[0], -1.0)));
        // the demand plus two outgoing flows, no self flow
        let outgoing = row.terms.iter().filter(|(_, c)| *c == -1.0).count();
        assert_eq!(outgoing, 3);
    }

    #[test]
    fn test_balance_row_for_empty_node() {
        let topology = NetworkTopology::uniform(3, 10.0, 1.0).unwrap();
        let registry = ParticipantRegistry::new(&topology, vec![], vec![]).unwrap();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();

        assert_eq!(model.variables.balance.len(), 3);
        let row = model.problem.constraint(model.variables.balance[2]);
        assert_eq!(row.terms.len(), 2);
    }

    #[test]
    fn test_custom_reference() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry)
            .with_reference(NodeId::new(2))
            .build()
            .unwrap();
        let row = model.problem.constraint(model.variables.reference_angle);
        assert_eq!(row.terms, vec![(model.variables.angle[2], 1.0)]);
        assert_eq!(row.rhs, 0.0);
    }

    #[test]
    fn test_reference_out_of_range() {
        let (topology, registry) = scenario();
        let err = ModelBuilder::new(&topology, &registry)
            .with_reference(NodeId::new(3))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::ClearingError::Case(CaseError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_registry_from_larger_network_is_rejected() {
        let (_, registry) = scenario();
        let smaller = NetworkTopology::uniform(2, 100.0, 500.0).unwrap();
        let err = ModelBuilder::new(&smaller, &registry).build().unwrap_err();
        match err {
            crate::ClearingError::Case(CaseError::InvalidParticipant(msg)) => {
                assert!(msg.contains("Node#2"), "{msg}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dc_rows_use_susceptance() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let vars = &model.variables;
        let row = model
            .problem
            .constraints()
            .iter()
            .find(|c| c.name == "dc_flow[2,0]")
            .unwrap();
        assert!(row.terms.contains(&(vars.angle[2], -500.0)));
        assert!(row.terms.contains(&(vars.angle[0], 500.0)));
        assert!(model.problem.validate().is_ok());
    }
}
