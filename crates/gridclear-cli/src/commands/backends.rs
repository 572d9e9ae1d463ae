use anyhow::Result;
use gridclear_algo::BackendRegistry;

pub fn handle() -> Result<()> {
    let registry = BackendRegistry::with_defaults();
    if registry.is_empty() {
        println!("no solver backends compiled in; rebuild with --features solver-clarabel or solver-highs");
        return Ok(());
    }

    let default = registry.select(None).map(|b| b.id().to_string()).ok();
    for id in registry.list() {
        if default.as_deref() == Some(id) {
            println!("{id} (default)");
        } else {
            println!("{id}");
        }
    }
    Ok(())
}
