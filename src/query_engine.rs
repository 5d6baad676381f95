//! Query Engine
//!
//! Relational joins over the loaded tables: everything the organism and
//! group pages need, assembled from the flat rows in `AmrData` and enriched
//! with antimicrobial names and classes.
//!
//! No method here fails. An unknown code, an organism without a breakpoint
//! group, or a group with no surviving members all come back as `None` or an
//! empty vector, which the caller renders as "no data available".

use crate::characteristics::{self, GramStain, Morphology, OxygenRequirement};
use crate::data::AmrData;
use crate::models::{Organism, Rank, TestMethod};
use crate::organism_group::map_to_group;
use crate::relevancy::{classify, Relevancy};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::Arc;

/// Dedup key used when a breakpoint row has no indication
const DEFAULT_INDICATION: &str = "default";

/// Species shown on the landing page, in display order
pub const COMMON_ORGANISM_NAMES: &[&str] = &[
    "Escherichia coli",
    "Staphylococcus aureus",
    "Klebsiella pneumoniae",
    "Pseudomonas aeruginosa",
    "Streptococcus pneumoniae",
    "Enterococcus faecalis",
    "Acinetobacter baumannii",
    "Salmonella enterica",
    "Enterobacter cloacae",
    "Haemophilus influenzae",
    "Neisseria gonorrhoeae",
    "Campylobacter jejuni",
];

// ============================================================================
// Result Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResistanceEntry {
    pub ab_code: String,
    pub name: String,
    pub group: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointEntry {
    pub organism_group: String,
    pub category: Option<String>,
    pub ab_code: String,
    pub antimicrobial_name: String,
    pub antimicrobial_group: Vec<String>,
    pub method: TestMethod,
    pub indication: Option<String>,
    pub disk_dose: Option<String>,
    pub susceptible_threshold: Option<f64>,
    pub resistant_threshold: Option<f64>,
    pub unit: Option<String>,
    pub uti: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcoffEntry {
    pub ab_code: String,
    pub antimicrobial_name: String,
    pub antimicrobial_group: Vec<String>,
    pub method: TestMethod,
    pub disk_dose: Option<String>,
    pub cutoff_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRef {
    pub group_code: String,
    pub group_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub code: String,
    pub name: String,
    pub organism: Organism,
    pub relevancy: Relevancy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_code: String,
    pub group_name: String,
    pub member_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_organisms: usize,
    pub total_antimicrobials: usize,
    pub total_breakpoints: usize,
    pub total_ecoffs: usize,
    pub total_intrinsic_resistances: usize,
    pub total_group_memberships: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonOrganism {
    pub organism: Organism,
    pub relevancy: Relevancy,
    pub breakpoint_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyLevel {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganismDetail {
    pub organism: Organism,
    pub relevancy: Relevancy,
    pub gram_stain: Option<GramStain>,
    pub morphology: Option<Morphology>,
    pub oxygen_requirement: Option<OxygenRequirement>,
    pub taxonomy: Vec<TaxonomyLevel>,
    pub organism_group: Option<&'static str>,
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone)]
pub struct QueryEngine {
    data: Arc<AmrData>,
}

impl QueryEngine {
    pub fn new(data: Arc<AmrData>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &AmrData {
        &self.data
    }

    pub fn organism(&self, mo: &str) -> Option<&Organism> {
        self.data.organism(mo)
    }

    /// Intrinsic resistances of one organism, in table order
    pub fn resistance_for(&self, mo: &str) -> Vec<ResistanceEntry> {
        self.data
            .intrinsic_resistance()
            .iter()
            .filter(|ir| ir.mo == mo)
            .map(|ir| match self.data.antimicrobial(&ir.ab) {
                Some(ab) => ResistanceEntry {
                    ab_code: ir.ab.clone(),
                    name: ab.name.clone(),
                    group: ab.group.clone(),
                },
                None => ResistanceEntry {
                    ab_code: ir.ab.clone(),
                    name: ir.ab.clone(),
                    group: Vec::new(),
                },
            })
            .collect()
    }

    /// Clinical breakpoints applicable to one organism via its EUCAST group.
    ///
    /// Rows are deduplicated on (ab, method, indication), keeping the first
    /// occurrence; overlapping guideline sheets repeat rows verbatim.
    pub fn breakpoints_for(&self, mo: &str) -> Vec<BreakpointEntry> {
        let Some(organism) = self.data.organism(mo) else {
            return Vec::new();
        };
        let Some(group) = map_to_group(organism) else {
            tracing::debug!("No EUCAST group for {} ({})", mo, organism.fullname);
            return Vec::new();
        };

        let mut seen: FxHashSet<(&str, TestMethod, &str)> = FxHashSet::default();

        self.data
            .breakpoints()
            .iter()
            .filter(|bp| bp.organism_group == group)
            .filter(|bp| {
                let indication = bp
                    .indication
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_INDICATION);
                seen.insert((bp.ab.as_str(), bp.method, indication))
            })
            .map(|bp| {
                let ab = self.data.antimicrobial(&bp.ab);
                let antimicrobial_name = bp
                    .antimicrobial
                    .clone()
                    .filter(|s| !s.is_empty())
                    .or_else(|| ab.map(|a| a.name.clone()))
                    .unwrap_or_else(|| bp.ab.clone());

                BreakpointEntry {
                    organism_group: bp.organism_group.clone(),
                    category: bp.category.clone(),
                    ab_code: bp.ab.clone(),
                    antimicrobial_name,
                    antimicrobial_group: ab.map(|a| a.group.clone()).unwrap_or_default(),
                    method: bp.method,
                    indication: bp.indication.clone(),
                    disk_dose: bp.disk_dose.clone(),
                    susceptible_threshold: bp.breakpoint_s,
                    resistant_threshold: bp.breakpoint_r,
                    unit: bp.unit.clone(),
                    uti: bp.indication.as_deref() == Some("UTI"),
                }
            })
            .collect()
    }

    /// ECOFFs recorded for this exact organism, one per (ab, method)
    pub fn ecoffs_for(&self, mo: &str) -> Vec<EcoffEntry> {
        let mut seen: FxHashSet<(&str, TestMethod)> = FxHashSet::default();

        self.data
            .ecoffs()
            .iter()
            .filter(|e| e.mo == mo)
            .filter(|e| seen.insert((e.ab.as_str(), e.method)))
            .map(|e| {
                let ab = self.data.antimicrobial(&e.ab);
                EcoffEntry {
                    ab_code: e.ab.clone(),
                    antimicrobial_name: ab.map_or_else(|| e.ab.clone(), |a| a.name.clone()),
                    antimicrobial_group: ab.map(|a| a.group.clone()).unwrap_or_default(),
                    method: e.method,
                    disk_dose: e.disk_dose.clone(),
                    cutoff_value: e.breakpoint_s,
                }
            })
            .collect()
    }

    /// Named groups the organism belongs to
    pub fn groups_for(&self, mo: &str) -> Vec<GroupRef> {
        self.data
            .group_memberships()
            .iter()
            .filter(|g| g.mo == mo)
            .map(|g| GroupRef {
                group_code: g.mo_group.clone(),
                group_name: g.mo_group_name.clone(),
            })
            .collect()
    }

    /// Members of a named group joined to their organism records.
    ///
    /// Memberships pointing at an organism missing from the table are dropped.
    pub fn members_of(&self, group_code: &str) -> Vec<GroupMember> {
        self.data
            .group_memberships()
            .iter()
            .filter(|g| g.mo_group == group_code)
            .filter_map(|g| {
                let organism = self.data.organism(&g.mo)?;
                Some(GroupMember {
                    code: g.mo.clone(),
                    name: g.mo_name.clone(),
                    organism: organism.clone(),
                    relevancy: classify(organism.prevalence),
                })
            })
            .collect()
    }

    /// Group header: name and raw membership row count
    pub fn group_by_code(&self, group_code: &str) -> Option<GroupSummary> {
        let memberships = self.data.group_memberships();
        let first = memberships.iter().find(|g| g.mo_group == group_code)?;
        let member_count = memberships.iter().filter(|g| g.mo_group == group_code).count();

        Some(GroupSummary {
            group_code: first.mo_group.clone(),
            group_name: first.mo_group_name.clone(),
            member_count,
        })
    }

    pub fn organism_detail(&self, mo: &str) -> Option<OrganismDetail> {
        let organism = self.data.organism(mo)?;

        Some(OrganismDetail {
            relevancy: classify(organism.prevalence),
            gram_stain: characteristics::gram_stain(organism),
            morphology: characteristics::morphology(organism),
            oxygen_requirement: characteristics::oxygen_requirement(organism),
            taxonomy: taxonomy_path(organism),
            organism_group: map_to_group(organism),
            organism: organism.clone(),
        })
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            total_organisms: self.data.organisms().len(),
            total_antimicrobials: self.data.antimicrobials().len(),
            total_breakpoints: self.data.breakpoints().len(),
            total_ecoffs: self.data.ecoffs().len(),
            total_intrinsic_resistances: self.data.intrinsic_resistance().len(),
            total_group_memberships: self.data.group_memberships().len(),
        }
    }

    /// Well-known pathogens present in the dataset, with breakpoint counts
    pub fn common_organisms(&self, limit: usize) -> Vec<CommonOrganism> {
        let mut results = Vec::new();

        for name in COMMON_ORGANISM_NAMES {
            if results.len() >= limit {
                break;
            }
            let Some(organism) = self
                .data
                .organisms()
                .iter()
                .find(|o| o.fullname.eq_ignore_ascii_case(name))
            else {
                continue;
            };

            let breakpoint_count = map_to_group(organism).map_or(0, |group| {
                self.data
                    .breakpoints()
                    .iter()
                    .filter(|bp| bp.organism_group == group)
                    .count()
            });

            results.push(CommonOrganism {
                organism: organism.clone(),
                relevancy: classify(organism.prevalence),
                breakpoint_count,
            });
        }

        results
    }
}

/// Kingdom -> genus (-> species), skipping blanks and "(unknown ...)" placeholders
fn taxonomy_path(organism: &Organism) -> Vec<TaxonomyLevel> {
    let mut levels = vec![
        ("Kingdom", &organism.kingdom),
        ("Phylum", &organism.phylum),
        ("Class", &organism.class),
        ("Order", &organism.order),
        ("Family", &organism.family),
        ("Genus", &organism.genus),
    ];
    if organism.rank == Rank::Species && !organism.species.is_empty() {
        levels.push(("Species", &organism.species));
    }

    levels
        .into_iter()
        .filter(|(_, value)| !value.is_empty() && !value.contains("(unknown"))
        .map(|(label, value)| TaxonomyLevel { label, value: value.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Tables;
    use crate::models::{Antimicrobial, ClinicalBreakpoint, Ecoff, GroupMembership, IntrinsicResistance};

    fn organism(mo: &str, fullname: &str, genus: &str, order: &str, prevalence: f64) -> Organism {
        Organism {
            mo: mo.to_string(),
            fullname: fullname.to_string(),
            rank: Rank::Species,
            kingdom: "Bacteria".to_string(),
            phylum: "Pseudomonadota".to_string(),
            class: "Gammaproteobacteria".to_string(),
            order: order.to_string(),
            family: "(unknown family)".to_string(),
            genus: genus.to_string(),
            species: fullname.split_whitespace().nth(1).unwrap_or("").to_string(),
            prevalence,
            oxygen_tolerance: Some("facultative anaerobe".to_string()),
        }
    }

    fn antimicrobial(ab: &str, name: &str, group: &str) -> Antimicrobial {
        Antimicrobial { ab: ab.to_string(), name: name.to_string(), group: vec![group.to_string()] }
    }

    fn breakpoint(group: &str, ab: &str, method: TestMethod, indication: Option<&str>, s: f64) -> ClinicalBreakpoint {
        ClinicalBreakpoint {
            guideline: Some("EUCAST 2026".to_string()),
            organism_group: group.to_string(),
            antimicrobial: None,
            ab: ab.to_string(),
            category: Some("Penicillins".to_string()),
            method,
            disk_dose: None,
            breakpoint_s: Some(s),
            breakpoint_r: Some(s * 2.0),
            unit: Some("mg/L".to_string()),
            indication: indication.map(str::to_string),
        }
    }

    fn ecoff(mo: &str, ab: &str, method: TestMethod, value: f64) -> Ecoff {
        Ecoff { mo: mo.to_string(), ab: ab.to_string(), method, disk_dose: None, breakpoint_s: Some(value) }
    }

    fn membership(group: &str, name: &str, mo: &str) -> GroupMembership {
        GroupMembership {
            mo_group: group.to_string(),
            mo_group_name: name.to_string(),
            mo: mo.to_string(),
            mo_name: mo.to_string(),
        }
    }

    fn engine() -> QueryEngine {
        let tables = Tables {
            organisms: vec![
                organism("B_ESCHR_COLI", "Escherichia coli", "Escherichia", "Enterobacterales", 1.0),
                organism("B_KLBSL_PNMN", "Klebsiella pneumoniae", "Klebsiella", "Enterobacterales", 1.0),
                organism("B_THRMS_AQTC", "Thermus aquaticus", "Thermus", "Thermales", 2.0),
            ],
            antimicrobials: vec![
                antimicrobial("AMP", "Ampicillin", "Beta-lactams/penicillins"),
                antimicrobial("CIP", "Ciprofloxacin", "Quinolones"),
            ],
            intrinsic_resistance: vec![
                IntrinsicResistance { mo: "B_KLBSL_PNMN".to_string(), ab: "AMP".to_string() },
                IntrinsicResistance { mo: "B_KLBSL_PNMN".to_string(), ab: "ZZZ".to_string() },
                IntrinsicResistance { mo: "B_ESCHR_COLI".to_string(), ab: "CIP".to_string() },
            ],
            breakpoints: vec![
                breakpoint("Enterobacterales", "AMP", TestMethod::Mic, None, 8.0),
                breakpoint("Enterobacterales", "AMP", TestMethod::Mic, None, 99.0),
                breakpoint("Enterobacterales", "AMP", TestMethod::Mic, Some("UTI"), 16.0),
                breakpoint("Enterobacterales", "AMP", TestMethod::Disk, None, 14.0),
                breakpoint("Staphylococcus spp.", "AMP", TestMethod::Mic, None, 0.125),
            ],
            ecoffs: vec![
                ecoff("B_ESCHR_COLI", "AMP", TestMethod::Mic, 8.0),
                ecoff("B_ESCHR_COLI", "AMP", TestMethod::Mic, 4.0),
                ecoff("B_ESCHR_COLI", "AMP", TestMethod::Disk, 14.0),
                ecoff("B_KLBSL_PNMN", "CIP", TestMethod::Mic, 0.125),
            ],
            groups: vec![
                membership("B_ENTRBC_GRP", "Enteric group", "B_ESCHR_COLI"),
                membership("B_ENTRBC_GRP", "Enteric group", "B_MISSING"),
                membership("B_ENTRBC_GRP", "Enteric group", "B_KLBSL_PNMN"),
            ],
        };
        QueryEngine::new(Arc::new(AmrData::from_tables(tables)))
    }

    #[test]
    fn test_resistance_enriched_with_fallback() {
        let rows = engine().resistance_for("B_KLBSL_PNMN");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ampicillin");
        assert_eq!(rows[0].group, vec!["Beta-lactams/penicillins".to_string()]);
        assert_eq!(rows[1].ab_code, "ZZZ");
        assert_eq!(rows[1].name, "ZZZ");
        assert!(rows[1].group.is_empty());
    }

    #[test]
    fn test_resistance_unknown_code_is_empty() {
        assert!(engine().resistance_for("B_NOPE").is_empty());
    }

    #[test]
    fn test_breakpoints_deduplicated_first_wins() {
        let rows = engine().breakpoints_for("B_ESCHR_COLI");
        // MIC default, MIC UTI, DISK default; the second MIC default row is dropped
        assert_eq!(rows.len(), 3);
        let mic_default: Vec<_> = rows
            .iter()
            .filter(|r| r.method == TestMethod::Mic && r.indication.is_none())
            .collect();
        assert_eq!(mic_default.len(), 1);
        assert_eq!(mic_default[0].susceptible_threshold, Some(8.0));
        assert!(rows.iter().all(|r| r.organism_group == "Enterobacterales"));
    }

    #[test]
    fn test_breakpoints_enrichment() {
        let rows = engine().breakpoints_for("B_KLBSL_PNMN");
        let uti = rows.iter().find(|r| r.indication.as_deref() == Some("UTI")).unwrap();
        assert!(uti.uti);
        assert_eq!(uti.antimicrobial_name, "Ampicillin");
        assert_eq!(uti.antimicrobial_group, vec!["Beta-lactams/penicillins".to_string()]);
        assert!(rows.iter().filter(|r| r.indication.is_none()).all(|r| !r.uti));
    }

    #[test]
    fn test_breakpoints_unmapped_or_unknown_is_empty() {
        let engine = engine();
        assert!(engine.breakpoints_for("B_THRMS_AQTC").is_empty());
        assert!(engine.breakpoints_for("B_NOPE").is_empty());
    }

    #[test]
    fn test_ecoffs_are_per_organism() {
        let engine = engine();
        let coli = engine.ecoffs_for("B_ESCHR_COLI");
        assert_eq!(coli.len(), 2);
        assert_eq!(coli[0].cutoff_value, Some(8.0));
        assert_eq!(coli[1].method, TestMethod::Disk);

        let kleb = engine.ecoffs_for("B_KLBSL_PNMN");
        assert_eq!(kleb.len(), 1);
        assert_eq!(kleb[0].ab_code, "CIP");
        assert_eq!(kleb[0].antimicrobial_name, "Ciprofloxacin");

        assert!(engine.ecoffs_for("B_THRMS_AQTC").is_empty());
    }

    #[test]
    fn test_groups_and_members() {
        let engine = engine();
        let groups = engine.groups_for("B_ESCHR_COLI");
        assert_eq!(groups, vec![GroupRef { group_code: "B_ENTRBC_GRP".to_string(), group_name: "Enteric group".to_string() }]);

        let members = engine.members_of("B_ENTRBC_GRP");
        let codes: Vec<&str> = members.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, vec!["B_ESCHR_COLI", "B_KLBSL_PNMN"]);
        assert!(engine.members_of("B_NOPE").is_empty());
    }

    #[test]
    fn test_group_summary_counts_raw_rows() {
        let engine = engine();
        let summary = engine.group_by_code("B_ENTRBC_GRP").unwrap();
        assert_eq!(summary.group_name, "Enteric group");
        assert_eq!(summary.member_count, 3);
        assert!(engine.group_by_code("B_NOPE").is_none());
    }

    #[test]
    fn test_organism_detail() {
        let engine = engine();
        let detail = engine.organism_detail("B_ESCHR_COLI").unwrap();
        assert_eq!(detail.relevancy.label, "Very Common");
        assert_eq!(detail.organism_group, Some("Enterobacterales"));
        let labels: Vec<&str> = detail.taxonomy.iter().map(|t| t.label).collect();
        // Family is an "(unknown family)" placeholder and is skipped
        assert_eq!(labels, vec!["Kingdom", "Phylum", "Class", "Order", "Genus", "Species"]);
        assert!(detail.oxygen_requirement.is_some());
        assert!(engine.organism_detail("B_NOPE").is_none());
    }

    #[test]
    fn test_stats_and_common() {
        let engine = engine();
        let stats = engine.stats();
        assert_eq!(stats.total_organisms, 3);
        assert_eq!(stats.total_breakpoints, 5);
        assert_eq!(stats.total_ecoffs, 4);

        let common = engine.common_organisms(8);
        let names: Vec<&str> = common.iter().map(|c| c.organism.fullname.as_str()).collect();
        assert_eq!(names, vec!["Escherichia coli", "Klebsiella pneumoniae"]);
        assert_eq!(common[0].breakpoint_count, 4);

        assert_eq!(engine.common_organisms(1).len(), 1);
        assert!(engine.common_organisms(0).is_empty());
    }
}
