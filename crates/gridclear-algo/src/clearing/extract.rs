//! Turning raw solver values into a market dispatch.

use super::formulation::ClearingModel;
use crate::error::{ClearingError, ClearingResult};
use gridclear_core::{
    DemandId, GeneratorId, Megawatts, NetworkTopology, NodeId, ParticipantRegistry, PricePerMwh,
    Radians,
};
use gridclear_solver::{LpSolution, LpStatus, SolverError, VarId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Cleared quantity for one generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorDispatch {
    pub id: GeneratorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub node: NodeId,
    pub limit: Megawatts,
    pub price: PricePerMwh,
    pub quantity: Megawatts,
}

/// Served quantity for one demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandDispatch {
    pub id: DemandId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub node: NodeId,
    pub limit: Megawatts,
    pub price: PricePerMwh,
    pub quantity: Megawatts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub node: NodeId,
    pub angle: Radians,
    /// Local generation minus local consumption
    pub net_injection: Megawatts,
    /// Locational marginal price, when duals were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PricePerMwh>,
}

/// A pair carrying flow at its thermal limit, reported in the direction
/// of the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestedPair {
    pub from: NodeId,
    pub to: NodeId,
    pub flow: Megawatts,
    pub capacity: Megawatts,
}

/// Constraints active at the optimum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingSummary {
    pub congested_pairs: Vec<CongestedPair>,
    /// Generators dispatched at `max_output`
    pub generators_at_limit: Vec<GeneratorId>,
    /// Demands served up to `max_load`
    pub demands_at_limit: Vec<DemandId>,
}

impl BindingSummary {
    pub fn is_congested(&self) -> bool {
        !self.congested_pairs.is_empty()
    }
}

/// Full clearing outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub status: LpStatus,
    /// Backend id, filled in by the caller that picked the backend
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub solve_time_ms: u64,
    pub reference: NodeId,
    /// Σ bid·served − Σ offer·output
    pub welfare: f64,
    pub generators: Vec<GeneratorDispatch>,
    pub demands: Vec<DemandDispatch>,
    /// `flows[i][j]` is the flow from node i to node j; the diagonal is zero
    pub flows: Vec<Vec<f64>>,
    pub nodes: Vec<NodeResult>,
    pub binding: BindingSummary,
}

impl DispatchReport {
    pub fn flow(&self, from: NodeId, to: NodeId) -> Megawatts {
        Megawatts(
            self.flows
                .get(from.value())
                .and_then(|row| row.get(to.value()))
                .copied()
                .unwrap_or(0.0),
        )
    }

    pub fn total_generation(&self) -> Megawatts {
        self.generators.iter().map(|g| g.quantity).sum()
    }

    pub fn total_consumption(&self) -> Megawatts {
        self.demands.iter().map(|d| d.quantity).sum()
    }

    /// Nodal prices, if every node has one.
    pub fn prices(&self) -> Option<Vec<PricePerMwh>> {
        self.nodes.iter().map(|n| n.price).collect()
    }
}

/// Reads a [`ClearingModel`]'s solution back into market terms.
#[derive(Debug, Clone, Copy)]
pub struct ResultExtractor {
    /// Relative tolerance for the welfare cross-check and binding detection
    pub tolerance: f64,
    /// Derive nodal prices from balance duals when the backend returned them
    pub compute_prices: bool,
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            compute_prices: true,
        }
    }
}

impl ResultExtractor {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    pub fn with_prices(mut self, compute_prices: bool) -> Self {
        self.compute_prices = compute_prices;
        self
    }

    pub fn extract(
        &self,
        model: &ClearingModel,
        solution: &LpSolution,
        topology: &NetworkTopology,
        registry: &ParticipantRegistry,
    ) -> ClearingResult<DispatchReport> {
        check_status(solution)?;

        if solution.primal.len() != model.problem.num_vars() {
            return Err(SolverError::backend(
                "unknown",
                format!(
                    "solution has {} values for {} variables",
                    solution.primal.len(),
                    model.problem.num_vars()
                ),
            )
            .into());
        }

        let vars = &model.variables;
        let value = |var: VarId| solution.primal[var.index()];

        let generators: Vec<GeneratorDispatch> = registry
            .generators()
            .iter()
            .zip(&vars.generation)
            .map(|(gen, &var)| GeneratorDispatch {
                id: gen.id,
                name: gen.name.clone(),
                node: gen.location,
                limit: gen.max_output,
                price: gen.offer_price,
                quantity: Megawatts(value(var)),
            })
            .collect();

        let demands: Vec<DemandDispatch> = registry
            .demands()
            .iter()
            .zip(&vars.consumption)
            .map(|(demand, &var)| DemandDispatch {
                id: demand.id,
                name: demand.name.clone(),
                node: demand.location,
                limit: demand.max_load,
                price: demand.bid_price,
                quantity: Megawatts(value(var)),
            })
            .collect();

        let welfare = demands
            .iter()
            .map(|d| d.price.value_of(d.quantity))
            .sum::<f64>()
            - generators
                .iter()
                .map(|g| g.price.value_of(g.quantity))
                .sum::<f64>();

        let scale = welfare.abs().max(solution.objective.abs()).max(1.0);
        if (welfare - solution.objective).abs() > self.tolerance.max(1e-9) * scale {
            return Err(SolverError::backend(
                "unknown",
                format!(
                    "objective {} disagrees with recomputed welfare {welfare}",
                    solution.objective
                ),
            )
            .into());
        }

        let n = topology.node_count();
        let mut flows = vec![vec![0.0; n]; n];
        for from in topology.nodes() {
            for to in topology.nodes() {
                if let Some(var) = vars.flow(from, to) {
                    flows[from.value()][to.value()] = value(var);
                }
            }
        }

        let prices = self.nodal_prices(model, solution);
        let nodes: Vec<NodeResult> = topology
            .nodes()
            .map(|node| {
                let gen: f64 = registry
                    .generators_at(node)
                    .iter()
                    .map(|&g| generators[g].quantity.value())
                    .sum();
                let load: f64 = registry
                    .demands_at(node)
                    .iter()
                    .map(|&d| demands[d].quantity.value())
                    .sum();
                NodeResult {
                    node,
                    angle: Radians(value(vars.angle[node.value()])),
                    net_injection: Megawatts(gen - load),
                    price: prices.as_ref().map(|p| p[node.value()]),
                }
            })
            .collect();

        let binding = self.binding_summary(topology, &flows, &generators, &demands);

        Ok(DispatchReport {
            status: solution.status,
            backend: String::new(),
            solve_time_ms: 0,
            reference: model.reference,
            welfare,
            generators,
            demands,
            flows,
            nodes,
            binding,
        })
    }

    fn nodal_prices(&self, model: &ClearingModel, solution: &LpSolution) -> Option<Vec<PricePerMwh>> {
        if !self.compute_prices {
            return None;
        }
        let prices: Option<Vec<PricePerMwh>> = model
            .variables
            .balance
            .iter()
            .map(|&row| solution.dual(row).map(|dual| PricePerMwh(-dual)))
            .collect();
        if prices.is_none() {
            warn!("backend returned no duals; nodal prices unavailable");
        }
        prices
    }

    fn at_limit(&self, value: f64, limit: f64) -> bool {
        limit > 0.0 && value >= limit - self.tolerance.max(1e-6) * limit.max(1.0)
    }

    fn binding_summary(
        &self,
        topology: &NetworkTopology,
        flows: &[Vec<f64>],
        generators: &[GeneratorDispatch],
        demands: &[DemandDispatch],
    ) -> BindingSummary {
        let congested_pairs = topology
            .ordered_pairs()
            .filter(|pair| {
                let flow = flows[pair.from.value()][pair.to.value()];
                flow > 0.0 && self.at_limit(flow, pair.capacity.value())
            })
            .map(|pair| CongestedPair {
                from: pair.from,
                to: pair.to,
                flow: Megawatts(flows[pair.from.value()][pair.to.value()]),
                capacity: pair.capacity,
            })
            .collect();

        BindingSummary {
            congested_pairs,
            generators_at_limit: generators
                .iter()
                .filter(|g| self.at_limit(g.quantity.value(), g.limit.value()))
                .map(|g| g.id)
                .collect(),
            demands_at_limit: demands
                .iter()
                .filter(|d| self.at_limit(d.quantity.value(), d.limit.value()))
                .map(|d| d.id)
                .collect(),
        }
    }
}

/// Extract with the default extractor settings.
pub fn extract(
    model: &ClearingModel,
    solution: &LpSolution,
    topology: &NetworkTopology,
    registry: &ParticipantRegistry,
    tolerance: f64,
) -> ClearingResult<DispatchReport> {
    ResultExtractor::new(tolerance).extract(model, solution, topology, registry)
}

fn check_status(solution: &LpSolution) -> ClearingResult<()> {
    let detail = solution.message.clone().unwrap_or_default();
    match solution.status {
        LpStatus::Optimal => Ok(()),
        LpStatus::Infeasible => Err(ClearingError::InfeasibleMarket(detail)),
        LpStatus::Unbounded => Err(ClearingError::UnboundedMarket(detail)),
        LpStatus::SolverError => Err(SolverError::backend("unknown", detail).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearing::formulation::ModelBuilder;
    use gridclear_core::{Demand, Generator};

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

    /// The known optimum of the scenario, written by hand.
    fn optimal_solution(model: &ClearingModel) -> LpSolution {
        let vars = &model.variables;
        let mut primal = vec![0.0; model.problem.num_vars()];
        primal[vars.generation[0].index()] = 100.0;
        primal[vars.generation[1].index()] = 50.0;
        primal[vars.consumption[0].index()] = 100.0;
        primal[vars.consumption[1].index()] = 50.0;
        primal[vars.angle[1].index()] = -0.1;
        primal[vars.angle[2].index()] = -0.1;
        for (from, to, flow) in [(0, 1, 50.0), (0, 2, 50.0)] {
            let f = vars.flow(NodeId::new(from), NodeId::new(to)).unwrap();
            let r = vars.flow(NodeId::new(to), NodeId::new(from)).unwrap();
            primal[f.index()] = flow;
            primal[r.index()] = -flow;
        }
        let objective = model.problem.evaluate_objective(&primal);
        let mut duals = vec![0.0; model.problem.num_constraints()];
        for row in &vars.balance {
            duals[row.index()] = -20.0;
        }
        LpSolution::optimal(primal, objective).with_duals(duals)
    }

    #[test]
    fn test_extracts_scenario() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        assert_eq!(model.problem.max_violation(&optimal_solution(&model).primal), 0.0);

        let report = ResultExtractor::default()
            .extract(&model, &optimal_solution(&model), &topology, &registry)
            .unwrap();

        assert_eq!(report.welfare, 3550.0);
        assert_eq!(report.generators[1].quantity, Megawatts(50.0));
        assert_eq!(report.demands[1].quantity, Megawatts(50.0));
        assert_eq!(report.flow(NodeId::new(0), NodeId::new(2)), Megawatts(50.0));
        assert_eq!(report.flow(NodeId::new(2), NodeId::new(2)), Megawatts(0.0));
        assert_eq!(report.nodes[0].net_injection, Megawatts(100.0));
        assert_eq!(report.prices(), Some(vec![PricePerMwh(20.0); 3]));
    }

    #[test]
    fn test_binding_summary() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let report = extract(&model, &optimal_solution(&model), &topology, &registry, 1e-6).unwrap();

        assert!(!report.binding.is_congested());
        assert_eq!(report.binding.generators_at_limit, vec![GeneratorId::new(0)]);
        assert_eq!(
            report.binding.demands_at_limit,
            vec![DemandId::new(0), DemandId::new(1)]
        );
    }

    #[test]
    fn test_prices_skipped_without_duals() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let mut solution = optimal_solution(&model);
        solution.duals = None;

        let report = ResultExtractor::default()
            .extract(&model, &solution, &topology, &registry)
            .unwrap();
        assert!(report.prices().is_none());

        let report = ResultExtractor::default()
            .with_prices(false)
            .extract(&model, &optimal_solution(&model), &topology, &registry)
            .unwrap();
        assert!(report.nodes.iter().all(|n| n.price.is_none()));
    }

    #[test]
    fn test_objective_mismatch_is_solver_error() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let mut solution = optimal_solution(&model);
        solution.objective += 10.0;

        let err = extract(&model, &solution, &topology, &registry, 1e-6).unwrap_err();
        assert!(matches!(err, ClearingError::Solver(_)));
    }

    #[test]
    fn test_status_mapping() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let extractor = ResultExtractor::default();

        let infeasible = LpSolution::terminated(LpStatus::Infeasible, "no feasible point");
        assert!(matches!(
            extractor.extract(&model, &infeasible, &topology, &registry),
            Err(ClearingError::InfeasibleMarket(_))
        ));

        let unbounded = LpSolution::terminated(LpStatus::Unbounded, "ray");
        assert!(matches!(
            extractor.extract(&model, &unbounded, &topology, &registry),
            Err(ClearingError::UnboundedMarket(_))
        ));

        let failed = LpSolution::terminated(LpStatus::SolverError, "numerical trouble");
        assert!(matches!(
            extractor.extract(&model, &failed, &topology, &registry),
            Err(ClearingError::Solver(_))
        ));
    }

    #[test]
    fn test_report_serializes() {
        let (topology, registry) = scenario();
        let model = ModelBuilder::new(&topology, &registry).build().unwrap();
        let report = extract(&model, &optimal_solution(&model), &topology, &registry, 1e-6).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "optimal");
        assert_eq!(json["generators"][0]["quantity"], 100.0);
        assert_eq!(json["nodes"][2]["price"], 20.0);
        assert_eq!(json["flows"][1][1], 0.0);
    }
}
