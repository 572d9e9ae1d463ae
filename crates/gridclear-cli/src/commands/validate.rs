use super::load_case;
use anyhow::{Context, Result};
use gridclear_algo::{ModelBuilder, DEFAULT_REFERENCE_NODE};
use std::path::Path;
use tracing::warn;

pub fn handle(case_path: &Path) -> Result<()> {
    let case = load_case(case_path)?;
    let label = case.label().to_string();
    let reference = case.reference_node.unwrap_or(DEFAULT_REFERENCE_NODE);

    let (topology, participants) = case
        .into_parts()
        .with_context(|| format!("validating {}", case_path.display()))?;
    let model = ModelBuilder::new(&topology, &participants)
        .with_reference(reference)
        .build()
        .context("building clearing model")?;

    let islands = topology.islands();
    if islands.len() > 1 {
        warn!(islands = islands.len(), "network has disconnected islands");
    }

    println!("{label}: ok");
    println!(
        "  nodes: {}, usable pairs: {}, islands: {}",
        topology.node_count(),
        topology.ordered_pairs().filter(|p| p.is_usable()).count(),
        islands.len()
    );
    println!(
        "  generators: {} ({:.1} MW), demands: {} ({:.1} MW)",
        participants.generators().len(),
        participants.total_generation_capacity().value(),
        participants.demands().len(),
        participants.total_demand_capacity().value()
    );
    println!(
        "  model: {} variables, {} constraints, reference {}",
        model.problem.num_vars(),
        model.problem.num_constraints(),
        reference
    );
    Ok(())
}
