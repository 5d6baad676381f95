// Dataset inspection tool
//
// Usage: cargo run --bin inspect_data -- [DATA_DIR] [QUERY] [MO_CODE]
//
// Prints table counts, the top hits for a sample search, and the joined
// detail for one organism code.

use anyhow::Context;
use bacteria_search::{AmrData, QueryEngine, SearchIndex};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "data".to_string());
    let query = args.next().unwrap_or_else(|| "coli".to_string());
    let mo = args.next().unwrap_or_else(|| "B_ESCHR_COLI".to_string());

    let data = Arc::new(
        AmrData::load(&data_dir).with_context(|| format!("loading datasets from {}", data_dir))?,
    );
    let engine = QueryEngine::new(Arc::clone(&data));
    let index = SearchIndex::build(data);

    println!("\n=== DATASET ===\n");
    let stats = engine.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    println!("\n=== SEARCH {:?} ===\n", query);
    for hit in index.search(&query, 10) {
        println!(
            "{:>4}  {:<16} {:<40} {}",
            hit.score, hit.code, hit.full_name, hit.relevancy.label
        );
    }

    println!("\n=== ORGANISM {} ===\n", mo);
    match engine.organism_detail(&mo) {
        None => println!("Not found"),
        Some(detail) => {
            println!("{}", serde_json::to_string_pretty(&detail)?);
            println!(
                "\nIntrinsic resistance: {}",
                engine.resistance_for(&mo).len()
            );
            println!("Breakpoints: {}", engine.breakpoints_for(&mo).len());
            println!("ECOFFs: {}", engine.ecoffs_for(&mo).len());
            for group in engine.groups_for(&mo) {
                println!("Group: {} ({})", group.group_name, group.group_code);
            }
        }
    }

    Ok(())
}
