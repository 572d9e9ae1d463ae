use super::load_case;
use anyhow::{Context, Result};
use gridclear_algo::{ClearingConfig, ClearingResult, DispatchReport, MarketClearing};
use gridclear_core::{NetworkTopology, NodeId, ParticipantRegistry};
use gridclear_solver::cancel_pair;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Arguments of `gridclear clear`, after flag parsing.
#[derive(Debug, Clone, Default)]
pub struct ClearArgs {
    pub case: PathBuf,
    pub config: Option<PathBuf>,
    pub backend: Option<String>,
    pub reference: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub prices: Option<bool>,
    pub out: Option<PathBuf>,
}

/// Command line flags win over the config file, which wins over the case.
fn resolve_config(args: &ClearArgs, case_reference: Option<NodeId>) -> Result<ClearingConfig> {
    let mut config = match &args.config {
        Some(path) => ClearingConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClearingConfig::default(),
    };

    if let Some(backend) = &args.backend {
        config.backend = Some(backend.clone());
    }
    if let Some(reference) = args.reference {
        config.reference_node = Some(NodeId::new(reference));
    }
    config.reference_node = config.reference_node.or(case_reference);
    if let Some(secs) = args.timeout_secs {
        config.timeout_seconds = secs;
    }
    if let Some(prices) = args.prices {
        config.compute_prices = prices;
    }
    Ok(config)
}

pub fn handle(args: &ClearArgs) -> Result<()> {
    let case = load_case(&args.case)?;
    let config = resolve_config(args, case.reference_node)?;
    let label = case.label().to_string();
    let (topology, participants) = case
        .into_parts()
        .with_context(|| format!("validating {}", args.case.display()))?;

    let clearing = MarketClearing::new(config);
    info!(
        case = %label,
        backends = ?clearing.backends().list(),
        "clearing market"
    );

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let report = clear_on_private_runtime(&clearing, &topology, &participants, interrupt)
        .context("starting async runtime")?
        .with_context(|| format!("clearing {label}"))?;

    write_report(&report, args.out.as_deref())?;
    if args.out.is_some() {
        print_summary(&label, &report);
    }
    Ok(())
}

/// Run the deadline-bounded solve on a runtime owned by this call.
///
/// `interrupt` resolving cancels the solve. The runtime is shut down without
/// joining its blocking pool, so an abandoned solve never holds up the exit.
pub(crate) fn clear_on_private_runtime<F>(
    clearing: &MarketClearing,
    topology: &NetworkTopology,
    participants: &ParticipantRegistry,
    interrupt: F,
) -> std::io::Result<ClearingResult<DispatchReport>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        let (handle, token) = cancel_pair();
        let watcher = tokio::spawn(async move {
            interrupt.await;
            warn!("interrupt received, cancelling solve");
            handle.cancel();
        });
        let result = clearing
            .clear_with_deadline(topology, participants, Some(token))
            .await;
        watcher.abort();
        result
    });
    runtime.shutdown_background();
    Ok(result)
}

fn write_report(report: &DispatchReport, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing dispatch report")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "dispatch report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary(label: &str, report: &DispatchReport) {
    println!("{label}: {} via {}", report.status, report.backend);
    println!("  welfare: {:.2}", report.welfare);
    println!(
        "  generation: {:.2} MW, consumption: {:.2} MW",
        report.total_generation().value(),
        report.total_consumption().value()
    );
    println!(
        "  congested pairs: {}, solve time: {} ms",
        report.binding.congested_pairs.len(),
        report.solve_time_ms
    );
    for node in &report.nodes {
        if let Some(price) = node.price {
            println!("  {}: {:.2} $/MWh", node.node, price.value());
        }
    }
}
