//! Organism characteristics for the detail view.
//!
//! Gram stain, cell morphology and oxygen requirement are not columns in the
//! dataset; they are inferred from lineage and from the free-text oxygen
//! tolerance field. Each inference is an ordered rule table with
//! first-match-wins semantics, like the organism group mapper. A matching
//! rule may itself yield `None` (wall-less bacteria have no Gram reaction).

use crate::models::Organism;
use serde::Serialize;

// ============================================================================
// Gram Stain
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stain {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GramStain {
    pub stain: Stain,
    pub label: &'static str,
}

const GRAM_POSITIVE: GramStain = GramStain { stain: Stain::Positive, label: "Gram-positive" };
const GRAM_NEGATIVE: GramStain = GramStain { stain: Stain::Negative, label: "Gram-negative" };
const ACID_FAST: GramStain = GramStain { stain: Stain::Positive, label: "Gram-positive (acid-fast)" };

const POSITIVE_PHYLA: &[&str] = &["bacillota", "firmicutes", "actinomycetota", "actinobacteria"];
const NEGATIVE_PHYLA: &[&str] = &[
    "pseudomonadota",
    "proteobacteria",
    "bacteroidota",
    "bacteroidetes",
    "campylobacterota",
    "spirochaetota",
    "spirochaetes",
    "fusobacteriota",
    "fusobacteria",
    "chlamydiota",
    "chlamydiae",
    "verrucomicrobiota",
];

/// Lowercased lineage the characteristic rules inspect
struct Lineage {
    phylum: String,
    class: String,
    order: String,
    family: String,
    genus: String,
}

impl Lineage {
    fn of(organism: &Organism) -> Self {
        Self {
            phylum: organism.phylum.to_lowercase(),
            class: organism.class.to_lowercase(),
            order: organism.order.to_lowercase(),
            family: organism.family.to_lowercase(),
            genus: organism.genus.to_lowercase(),
        }
    }

    fn genus_in(&self, genera: &[&str]) -> bool {
        genera.contains(&self.genus.as_str())
    }

    fn phylum_in(&self, phyla: &[&str]) -> bool {
        phyla.contains(&self.phylum.as_str())
    }
}

struct Rule<T> {
    matches: fn(&Lineage) -> bool,
    result: Option<T>,
}

fn first_match<T: Copy>(rules: &[Rule<T>], lineage: &Lineage) -> Option<T> {
    rules
        .iter()
        .find(|rule| (rule.matches)(lineage))
        .and_then(|rule| rule.result)
}

static GRAM_RULES: &[Rule<GramStain>] = &[
    Rule { matches: |l| l.genus_in(&["mycobacterium", "nocardia"]), result: Some(ACID_FAST) },
    Rule { matches: |l| l.genus_in(&["mycoplasma", "ureaplasma"]) || l.class == "mollicutes", result: None },
    Rule { matches: |l| l.class == "negativicutes", result: Some(GRAM_NEGATIVE) },
    Rule { matches: |l| l.phylum_in(POSITIVE_PHYLA), result: Some(GRAM_POSITIVE) },
    Rule { matches: |l| l.phylum_in(NEGATIVE_PHYLA), result: Some(GRAM_NEGATIVE) },
];

pub fn gram_stain(organism: &Organism) -> Option<GramStain> {
    first_match(GRAM_RULES, &Lineage::of(organism))
}

// ============================================================================
// Morphology
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Coccus,
    Rod,
    Spiral,
    Curved,
    Coccobacillus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Morphology {
    pub shape: Shape,
    pub label: &'static str,
}

const COCCUS: Morphology = Morphology { shape: Shape::Coccus, label: "Cocci" };
const ROD: Morphology = Morphology { shape: Shape::Rod, label: "Rod-shaped (bacilli)" };
const SPIRAL: Morphology = Morphology { shape: Shape::Spiral, label: "Spiral (spirochete)" };
const CURVED: Morphology = Morphology { shape: Shape::Curved, label: "Curved / spiral rod" };
const COCCOBACILLUS: Morphology = Morphology { shape: Shape::Coccobacillus, label: "Coccobacilli" };

const ROD_GENERA: &[&str] = &[
    "bacillus",
    "clostridium",
    "clostridioides",
    "pseudomonas",
    "listeria",
    "corynebacterium",
    "mycobacterium",
    "lactobacillus",
    "bacteroides",
    "legionella",
    "stenotrophomonas",
    "burkholderia",
    "achromobacter",
    "aeromonas",
    "fusobacterium",
    "prevotella",
];

static MORPHOLOGY_RULES: &[Rule<Morphology>] = &[
    Rule {
        matches: |l| l.phylum_in(&["spirochaetota", "spirochaetes"]) || l.genus_in(&["treponema", "borrelia", "leptospira"]),
        result: Some(SPIRAL),
    },
    Rule { matches: |l| l.genus_in(&["helicobacter", "campylobacter", "spirillum", "vibrio"]), result: Some(CURVED) },
    Rule {
        matches: |l| {
            l.genus_in(&[
                "acinetobacter",
                "haemophilus",
                "bordetella",
                "brucella",
                "pasteurella",
                "moraxella",
                "kingella",
                "coxiella",
            ])
        },
        result: Some(COCCOBACILLUS),
    },
    Rule {
        matches: |l| l.genus.ends_with("coccus") || l.genus_in(&["neisseria", "veillonella"]),
        result: Some(COCCUS),
    },
    Rule { matches: |l| l.order == "enterobacterales" || l.genus_in(ROD_GENERA), result: Some(ROD) },
    // Families named after a rod genus ("Bacillaceae", "Pseudomonadaceae") fall through to here
    Rule { matches: |l| l.family.starts_with("bacill") || l.family.starts_with("pseudomonad"), result: Some(ROD) },
];

pub fn morphology(organism: &Organism) -> Option<Morphology> {
    first_match(MORPHOLOGY_RULES, &Lineage::of(organism))
}

// ============================================================================
// Oxygen Requirement
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OxygenKind {
    Facultative,
    Microaerophile,
    Aerotolerant,
    Anaerobe,
    Aerobe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OxygenRequirement {
    #[serde(rename = "type")]
    pub kind: OxygenKind,
    pub label: &'static str,
}

/// Checked in order: "facultative anaerobe" must not fall through to the
/// anaerobe rule, and "anaerobe" must not fall through to aerobe.
static OXYGEN_RULES: &[(&str, OxygenRequirement)] = &[
    ("facultative", OxygenRequirement { kind: OxygenKind::Facultative, label: "Facultative anaerobe" }),
    ("microaerophil", OxygenRequirement { kind: OxygenKind::Microaerophile, label: "Microaerophile" }),
    ("aerotolerant", OxygenRequirement { kind: OxygenKind::Aerotolerant, label: "Aerotolerant anaerobe" }),
    ("anaerob", OxygenRequirement { kind: OxygenKind::Anaerobe, label: "Obligate anaerobe" }),
    ("aerob", OxygenRequirement { kind: OxygenKind::Aerobe, label: "Obligate aerobe" }),
];

pub fn oxygen_requirement(organism: &Organism) -> Option<OxygenRequirement> {
    let text = organism.oxygen_tolerance.as_deref()?.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    OXYGEN_RULES
        .iter()
        .find(|(needle, _)| text.contains(*needle))
        .map(|(_, requirement)| *requirement)
}
