//! Source Table Records
//!
//! One struct per JSON table shipped in the data directory. Field names follow
//! the upstream AMR / EUCAST exports, so records deserialize verbatim and
//! unknown columns are ignored.
//!
//! Upstream exports write `null` for lineage levels that do not apply (e.g.
//! `species` on a genus record) and sometimes a bare string instead of a list
//! for antimicrobial groups; the deserializers below absorb both.

use serde::{Deserialize, Deserializer, Serialize};

/// Prevalence assigned when a record carries none: sorts after every coded
/// tier and never receives the clinical boost.
pub const UNCODED_PREVALENCE: f64 = 2.0;

fn default_prevalence() -> f64 {
    UNCODED_PREVALENCE
}

/// `null` or missing -> empty string
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `"Penicillins"`, `["Penicillins", "Beta-lactams"]` or `null`
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if !s.is_empty() => vec![s],
        Some(OneOrMany::One(_)) | None => Vec::new(),
        Some(OneOrMany::Many(v)) => v,
    })
}

/// Taxonomic rank of an organism record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Species,
    Genus,
    #[default]
    #[serde(other)]
    Other,
}

/// Microorganism taxonomy record (bacteria.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub mo: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub fullname: String,
    #[serde(default)]
    pub rank: Rank,
    #[serde(default, deserialize_with = "nullable_string")]
    pub kingdom: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub phylum: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub class: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub order: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub family: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub genus: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub species: String,
    #[serde(default = "default_prevalence")]
    pub prevalence: f64,
    #[serde(default)]
    pub oxygen_tolerance: Option<String>,
}

/// Antimicrobial agent (antimicrobials.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antimicrobial {
    pub ab: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub group: Vec<String>,
}

/// Organism is naturally resistant to antimicrobial (intrinsic_resistant.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrinsicResistance {
    pub mo: String,
    pub ab: String,
}

/// Susceptibility test method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestMethod {
    #[serde(rename = "MIC")]
    Mic,
    #[serde(rename = "DISK")]
    Disk,
}

impl TestMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            TestMethod::Mic => "MIC",
            TestMethod::Disk => "DISK",
        }
    }
}

/// EUCAST clinical breakpoint row (clinical_breakpoints_eucast2026.json)
///
/// Keyed by organism group rather than organism code: one row applies to
/// every organism the group mapper resolves to `organism_group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalBreakpoint {
    #[serde(default)]
    pub guideline: Option<String>,
    pub organism_group: String,
    /// Antimicrobial text as printed in the breakpoint table
    #[serde(default)]
    pub antimicrobial: Option<String>,
    pub ab: String,
    #[serde(default)]
    pub category: Option<String>,
    pub method: TestMethod,
    #[serde(default)]
    pub disk_dose: Option<String>,
    #[serde(rename = "breakpoint_S", default)]
    pub breakpoint_s: Option<f64>,
    #[serde(rename = "breakpoint_R", default)]
    pub breakpoint_r: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
}

/// EUCAST epidemiological cut-off (ecoffs_eucast2025.json)
///
/// The cut-off is stored in the susceptible-threshold column; ECOFFs have no
/// resistant threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ecoff {
    pub mo: String,
    pub ab: String,
    pub method: TestMethod,
    #[serde(default)]
    pub disk_dose: Option<String>,
    #[serde(rename = "breakpoint_S", default)]
    pub breakpoint_s: Option<f64>,
}

/// Named organism group membership (microorganisms_groups.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub mo_group: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mo_group_name: String,
    pub mo: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub mo_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organism_tolerates_nulls_and_extra_columns() {
        let json = r#"{
            "mo": "B_ESCHR", "fullname": "Escherichia", "status": "accepted",
            "kingdom": "Bacteria", "phylum": "Pseudomonadota", "class": "Gammaproteobacteria",
            "order": "Enterobacterales", "family": "Enterobacteriaceae",
            "genus": "Escherichia", "species": null, "rank": "genus",
            "prevalence": 1.0, "oxygen_tolerance": null, "snomed": []
        }"#;
        let organism: Organism = serde_json::from_str(json).unwrap();
        assert_eq!(organism.rank, Rank::Genus);
        assert_eq!(organism.species, "");
        assert!(organism.oxygen_tolerance.is_none());
    }

    #[test]
    fn test_organism_defaults() {
        let organism: Organism =
            serde_json::from_str(r#"{"mo": "B_THRMS_AQTC", "rank": "subspecies"}"#).unwrap();
        assert_eq!(organism.rank, Rank::Other);
        assert_eq!(organism.prevalence, UNCODED_PREVALENCE);
    }

    #[test]
    fn test_antimicrobial_group_shapes() {
        let many: Antimicrobial =
            serde_json::from_str(r#"{"ab": "AMC", "name": "Amoxicillin/clavulanic acid", "group": ["Beta-lactams/penicillins", "Penicillins"]}"#)
                .unwrap();
        assert_eq!(many.group.len(), 2);

        let one: Antimicrobial =
            serde_json::from_str(r#"{"ab": "GEN", "name": "Gentamicin", "group": "Aminoglycosides"}"#).unwrap();
        assert_eq!(one.group, vec!["Aminoglycosides".to_string()]);

        let none: Antimicrobial = serde_json::from_str(r#"{"ab": "XXX", "name": "X", "group": null}"#).unwrap();
        assert!(none.group.is_empty());
    }

    #[test]
    fn test_breakpoint_column_names() {
        let json = r#"{
            "guideline": "EUCAST 2026", "organism_group": "Enterobacterales",
            "antimicrobial": "Ampicillin", "ab": "AMP", "category": "Penicillins",
            "method": "DISK", "disk_dose": "10", "breakpoint_S": 14.0, "breakpoint_R": null,
            "unit": "mm", "indication": null, "source": "clinical"
        }"#;
        let bp: ClinicalBreakpoint = serde_json::from_str(json).unwrap();
        assert_eq!(bp.method, TestMethod::Disk);
        assert_eq!(bp.breakpoint_s, Some(14.0));
        assert_eq!(bp.breakpoint_r, None);
        assert_eq!(bp.disk_dose.as_deref(), Some("10"));
    }
}
