//! Bacteria Search
//!
//! Reference lookup over static antimicrobial resistance datasets.
//!
//! Module layout:
//! - `data`: Loads the six JSON tables once into an `AmrData` context
//! - `relevancy`: Prevalence code -> clinical relevancy tier
//! - `organism_group`: Taxonomy -> EUCAST breakpoint organism group
//! - `characteristics`: Gram stain, morphology and oxygen requirement
//! - `query_engine`: Joins for resistance, breakpoints, ECOFFs and groups
//! - `search_index`: Ranked free-text organism search
//! - `api_server`: JSON HTTP API (feature `api`)

pub mod characteristics;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod organism_group;
pub mod query_engine;
pub mod relevancy;
pub mod search_index;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use config::ServerConfig;
pub use data::{AmrData, Tables};
pub use error::{DataError, DataResult};
pub use organism_group::map_to_group;
pub use query_engine::QueryEngine;
pub use relevancy::{classify, Relevancy, RelevancyTier};
pub use search_index::{OrganismSummary, SearchIndex};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
