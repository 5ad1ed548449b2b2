use anyhow::Result;

use loregraph::config::LoreConfig;
use loregraph::retrieval::neighbors::{expand_neighbors, ExpandNeighborsArgs};

/// Walk the link graph outward from one entry and print what was reached.
pub fn neighbors(
    config: &LoreConfig,
    uid: i64,
    scope: Option<String>,
    depth: Option<i64>,
    limit: Option<i64>,
) -> Result<()> {
    let (catalog, allowed) = super::load_catalog(config)?;

    let args = ExpandNeighborsArgs {
        uid: Some(uid),
        scope,
        depth,
        limit,
    };
    let response = expand_neighbors(&catalog, &allowed, &args)?;

    println!(
        "[{}] {} (#{}), depth {}",
        response.source.scope, response.source.title, response.source.uid, response.depth
    );
    println!("{}", "=".repeat(50));

    if response.neighbors.is_empty() {
        println!("  No linked entries.");
        return Ok(());
    }

    for n in &response.neighbors {
        let path = n
            .path
            .iter()
            .map(|uid| format!("#{uid}"))
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("  {} [{}] {} (#{})  via {}", n.distance, n.scope, n.title, n.uid, path);
    }
    if response.total_reached > response.neighbors.len() {
        println!(
            "  ... {} more reachable",
            response.total_reached - response.neighbors.len()
        );
    }

    Ok(())
}
