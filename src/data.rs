//! Data Loading and Management
//!
//! Loads the six static JSON tables from a data directory once at startup and
//! keeps them for the lifetime of the process. Everything downstream (query
//! engine, search index, API state) holds an `Arc<AmrData>` handle; nothing
//! mutates a table after load.
//!
//! Derived code -> record indexes are built lazily on first lookup. Building
//! is idempotent, so concurrent first callers at worst race to an identical
//! map.

use crate::error::{DataError, DataResult};
use crate::models::{
    Antimicrobial, ClinicalBreakpoint, Ecoff, GroupMembership, IntrinsicResistance, Organism,
};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Instant;

pub const ORGANISMS_FILE: &str = "bacteria.json";
pub const ANTIMICROBIALS_FILE: &str = "antimicrobials.json";
pub const INTRINSIC_RESISTANCE_FILE: &str = "intrinsic_resistant.json";
pub const BREAKPOINTS_FILE: &str = "clinical_breakpoints_eucast2026.json";
pub const ECOFFS_FILE: &str = "ecoffs_eucast2025.json";
pub const GROUPS_FILE: &str = "microorganisms_groups.json";

/// Raw table contents, used to assemble an `AmrData` in memory
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub organisms: Vec<Organism>,
    pub antimicrobials: Vec<Antimicrobial>,
    pub intrinsic_resistance: Vec<IntrinsicResistance>,
    pub breakpoints: Vec<ClinicalBreakpoint>,
    pub ecoffs: Vec<Ecoff>,
    pub groups: Vec<GroupMembership>,
}

/// Main data holder: every table plus lazily built lookup indexes
pub struct AmrData {
    tables: Tables,

    /// mo code -> position in `tables.organisms`
    organisms_by_code: OnceCell<FxHashMap<String, usize>>,

    /// ab code -> position in `tables.antimicrobials`
    antimicrobials_by_code: OnceCell<FxHashMap<String, usize>>,
}

impl AmrData {
    /// Load all tables from `data_dir`
    ///
    /// A missing or unparsable file is a startup fault: the caller cannot
    /// serve any query without the full dataset.
    pub fn load(data_dir: impl AsRef<Path>) -> DataResult<Self> {
        let dir = data_dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::MissingDirectory(dir.to_path_buf()));
        }

        tracing::info!("Loading datasets from {}", dir.display());
        let start = Instant::now();

        let tables = Tables {
            organisms: load_table(&dir.join(ORGANISMS_FILE))?,
            antimicrobials: load_table(&dir.join(ANTIMICROBIALS_FILE))?,
            intrinsic_resistance: load_table(&dir.join(INTRINSIC_RESISTANCE_FILE))?,
            breakpoints: load_table(&dir.join(BREAKPOINTS_FILE))?,
            ecoffs: load_table(&dir.join(ECOFFS_FILE))?,
            groups: load_table(&dir.join(GROUPS_FILE))?,
        };

        tracing::info!("  Organisms: {}", tables.organisms.len());
        tracing::info!("  Antimicrobials: {}", tables.antimicrobials.len());
        tracing::info!("  Intrinsic resistance: {}", tables.intrinsic_resistance.len());
        tracing::info!("  Clinical breakpoints: {}", tables.breakpoints.len());
        tracing::info!("  ECOFFs: {}", tables.ecoffs.len());
        tracing::info!("  Group memberships: {}", tables.groups.len());
        tracing::info!("Datasets loaded in {:?}", start.elapsed());

        Ok(Self::from_tables(tables))
    }

    /// Wrap tables that are already in memory
    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables,
            organisms_by_code: OnceCell::new(),
            antimicrobials_by_code: OnceCell::new(),
        }
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.tables.organisms
    }

    pub fn antimicrobials(&self) -> &[Antimicrobial] {
        &self.tables.antimicrobials
    }

    pub fn intrinsic_resistance(&self) -> &[IntrinsicResistance] {
        &self.tables.intrinsic_resistance
    }

    pub fn breakpoints(&self) -> &[ClinicalBreakpoint] {
        &self.tables.breakpoints
    }

    pub fn ecoffs(&self) -> &[Ecoff] {
        &self.tables.ecoffs
    }

    pub fn group_memberships(&self) -> &[GroupMembership] {
        &self.tables.groups
    }

    /// Organism by mo code
    pub fn organism(&self, mo: &str) -> Option<&Organism> {
        let index = self
            .organisms_by_code
            .get_or_init(|| index_by(&self.tables.organisms, |o| &o.mo));
        index.get(mo).map(|&i| &self.tables.organisms[i])
    }

    /// Antimicrobial by ab code
    pub fn antimicrobial(&self, ab: &str) -> Option<&Antimicrobial> {
        let index = self
            .antimicrobials_by_code
            .get_or_init(|| index_by(&self.tables.antimicrobials, |a| &a.ab));
        index.get(ab).map(|&i| &self.tables.antimicrobials[i])
    }

    /// Display name for an ab code, falling back to the code itself
    pub fn antimicrobial_name<'a>(&'a self, ab: &'a str) -> &'a str {
        self.antimicrobial(ab).map_or(ab, |a| a.name.as_str())
    }
}

/// Read one JSON array file fully and release the handle before returning
fn load_table<T: DeserializeOwned>(path: &Path) -> DataResult<Vec<T>> {
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&bytes).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Build code -> position map. Later rows overwrite earlier ones on a
/// duplicate code.
fn index_by<T>(rows: &[T], key: impl Fn(&T) -> &String) -> FxHashMap<String, usize> {
    let mut map = FxHashMap::default();
    map.reserve(rows.len());
    for (i, row) in rows.iter().enumerate() {
        map.insert(key(row).clone(), i);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rank;
    use std::fs;

    fn organism(mo: &str, fullname: &str) -> Organism {
        Organism {
            mo: mo.to_string(),
            fullname: fullname.to_string(),
            rank: Rank::Species,
            kingdom: "Bacteria".to_string(),
            phylum: String::new(),
            class: String::new(),
            order: String::new(),
            family: String::new(),
            genus: String::new(),
            species: String::new(),
            prevalence: 1.0,
            oxygen_tolerance: None,
        }
    }

    fn write_minimal_dir(dir: &Path) {
        fs::write(
            dir.join(ORGANISMS_FILE),
            r#"[{"mo": "B_ESCHR_COLI", "fullname": "Escherichia coli", "rank": "species", "genus": "Escherichia", "prevalence": 1.0}]"#,
        )
        .unwrap();
        fs::write(
            dir.join(ANTIMICROBIALS_FILE),
            r#"[{"ab": "AMP", "name": "Ampicillin", "group": ["Beta-lactams/penicillins"]}]"#,
        )
        .unwrap();
        fs::write(dir.join(INTRINSIC_RESISTANCE_FILE), "[]").unwrap();
        fs::write(dir.join(BREAKPOINTS_FILE), "[]").unwrap();
        fs::write(dir.join(ECOFFS_FILE), "[]").unwrap();
        fs::write(dir.join(GROUPS_FILE), "[]").unwrap();
    }

    #[test]
    fn test_load_minimal_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_dir(dir.path());

        let data = AmrData::load(dir.path()).expect("minimal dataset should load");
        assert_eq!(data.organisms().len(), 1);
        assert_eq!(data.antimicrobials().len(), 1);
        assert!(data.breakpoints().is_empty());
        assert_eq!(
            data.organism("B_ESCHR_COLI").map(|o| o.fullname.as_str()),
            Some("Escherichia coli")
        );
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = AmrData::load("/nonexistent/amr/data").err().unwrap();
        assert!(matches!(err, DataError::MissingDirectory(_)));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_dir(dir.path());
        fs::remove_file(dir.path().join(ECOFFS_FILE)).unwrap();

        let err = AmrData::load(dir.path()).err().unwrap();
        match err {
            DataError::Io { path, .. } => assert!(path.ends_with(ECOFFS_FILE)),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_minimal_dir(dir.path());
        fs::write(dir.path().join(BREAKPOINTS_FILE), "{ not json").unwrap();

        let err = AmrData::load(dir.path()).err().unwrap();
        assert!(matches!(err, DataError::Parse { .. }));
    }

    #[test]
    fn test_index_lookups() {
        let data = AmrData::from_tables(Tables {
            organisms: vec![organism("B_A", "Alpha"), organism("B_B", "Beta")],
            antimicrobials: vec![Antimicrobial {
                ab: "VAN".to_string(),
                name: "Vancomycin".to_string(),
                group: vec!["Glycopeptides".to_string()],
            }],
            ..Tables::default()
        });

        assert_eq!(data.organism("B_B").map(|o| o.fullname.as_str()), Some("Beta"));
        assert!(data.organism("B_C").is_none());
        assert_eq!(data.antimicrobial_name("VAN"), "Vancomycin");
        assert_eq!(data.antimicrobial_name("ZZZ"), "ZZZ");

        // Second lookup reuses the same map
        let first = data.organisms_by_code.get().map(|m| m as *const _);
        data.organism("B_A");
        let second = data.organisms_by_code.get().map(|m| m as *const _);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_code_last_wins() {
        let data = AmrData::from_tables(Tables {
            organisms: vec![organism("B_A", "First"), organism("B_A", "Second")],
            ..Tables::default()
        });
        assert_eq!(data.organism("B_A").map(|o| o.fullname.as_str()), Some("Second"));
    }
}
