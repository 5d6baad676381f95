//! EUCAST Organism Group Mapping
//!
//! EUCAST publishes clinical breakpoints per reporting group ("Enterobacterales",
//! "Staphylococcus spp.", "Streptococcus pneumoniae", ...), not per species.
//! This module resolves an organism to the group whose breakpoint sheet
//! applies to it.
//!
//! Rules are evaluated top to bottom and the first match wins. Specific rules
//! must precede the general ones that would otherwise shadow them (the
//! S. pneumoniae rule sits above the catch-all Streptococcus genus rule).
//! Reordering changes results without any error.

use crate::models::Organism;

pub const ENTEROBACTERALES: &str = "Enterobacterales";
pub const ANAEROBIC_BACTERIA: &str = "Anaerobic bacteria";

/// Lowercased taxonomy fields the rules inspect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonKey {
    pub fullname: String,
    pub genus: String,
    pub family: String,
    pub order: String,
}

impl TaxonKey {
    pub fn from_organism(organism: &Organism) -> Self {
        Self {
            fullname: organism.fullname.to_lowercase(),
            genus: organism.genus.to_lowercase(),
            family: organism.family.to_lowercase(),
            order: organism.order.to_lowercase(),
        }
    }

    fn name_has(&self, needle: &str) -> bool {
        self.fullname.contains(needle)
    }

    fn genus_is(&self, genus: &str) -> bool {
        self.genus == genus
    }
}

/// One mapping rule: if `matches`, the organism belongs to `group`
pub struct GroupRule {
    pub group: &'static str,
    pub matches: fn(&TaxonKey) -> bool,
}

/// Ordered mapping table, first match wins
pub static GROUP_RULES: &[GroupRule] = &[
    // Enterobacterales by genus
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("escherichia coli") || t.genus_is("escherichia") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("klebsiella") || t.genus_is("klebsiella") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("salmonella") || t.genus_is("salmonella") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("enterobacter") || t.genus_is("enterobacter") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("citrobacter") || t.genus_is("citrobacter") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("proteus") || t.genus_is("proteus") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("morganella") || t.genus_is("morganella") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("serratia") || t.genus_is("serratia") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("providencia") || t.genus_is("providencia") },
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.name_has("shigella") || t.genus_is("shigella") },

    // Non-fermenters
    GroupRule {
        group: "Pseudomonas aeruginosa",
        matches: |t| t.name_has("pseudomonas aeruginosa") || (t.genus_is("pseudomonas") && t.name_has("aeruginosa")),
    },
    GroupRule { group: "Stenotrophomonas maltophilia", matches: |t| t.name_has("stenotrophomonas maltophilia") },
    GroupRule { group: "Acinetobacter spp.", matches: |t| t.genus_is("acinetobacter") },

    // Gram-positive cocci
    GroupRule { group: "Staphylococcus spp.", matches: |t| t.name_has("staphylococcus aureus") || t.genus_is("staphylococcus") },
    GroupRule { group: "Enterococcus spp.", matches: |t| t.genus_is("enterococcus") },
    GroupRule { group: "Streptococcus pneumoniae", matches: |t| t.name_has("streptococcus pneumoniae") },
    GroupRule {
        group: "Streptococcus groups A,B,C,G",
        matches: |t| t.name_has("streptococcus pyogenes") || t.name_has("streptococcus agalactiae"),
    },
    GroupRule { group: "Viridans group streptococci", matches: |t| t.genus_is("streptococcus") },

    // Fastidious respiratory / mucosal organisms
    GroupRule { group: "Haemophilus influenzae", matches: |t| t.name_has("haemophilus influenzae") || t.genus_is("haemophilus") },
    GroupRule { group: "Moraxella catarrhalis", matches: |t| t.name_has("moraxella catarrhalis") },
    GroupRule { group: "Neisseria gonorrhoeae", matches: |t| t.name_has("neisseria gonorrhoeae") },
    GroupRule { group: "Neisseria meningitidis", matches: |t| t.name_has("neisseria meningitidis") },

    GroupRule { group: "Helicobacter pylori", matches: |t| t.name_has("helicobacter pylori") },
    GroupRule { group: "Listeria monocytogenes", matches: |t| t.name_has("listeria monocytogenes") },
    GroupRule {
        group: "Campylobacter jejuni/coli",
        matches: |t| t.name_has("campylobacter jejuni") || t.name_has("campylobacter coli"),
    },

    GroupRule {
        group: "Corynebacterium diphtheriae/ulcerans",
        matches: |t| t.genus_is("corynebacterium") && (t.name_has("diphtheriae") || t.name_has("ulcerans")),
    },
    GroupRule { group: "Corynebacterium spp.", matches: |t| t.genus_is("corynebacterium") },

    GroupRule { group: "Pasteurella spp.", matches: |t| t.genus_is("pasteurella") },
    GroupRule { group: "Aeromonas spp.", matches: |t| t.genus_is("aeromonas") },
    GroupRule { group: "Vibrio spp.", matches: |t| t.genus_is("vibrio") },
    GroupRule { group: "Achromobacter xylosoxidans", matches: |t| t.name_has("achromobacter xylosoxidans") },
    GroupRule { group: "Kingella kingae", matches: |t| t.name_has("kingella kingae") },
    GroupRule { group: "Aerococcus sanguinicola/urinae", matches: |t| t.name_has("aerococcus") },

    GroupRule { group: "Bacillus anthracis", matches: |t| t.genus_is("bacillus") && t.name_has("anthracis") },
    GroupRule { group: "Bacillus spp.", matches: |t| t.genus_is("bacillus") },
    GroupRule { group: "Brucella melitensis", matches: |t| t.name_has("brucella melitensis") },
    GroupRule { group: "Burkholderia pseudomallei", matches: |t| t.name_has("burkholderia pseudomallei") },
    GroupRule { group: "Burkholderia cepacia", matches: |t| t.name_has("burkholderia cepacia") },
    GroupRule { group: "Legionella pneumophila", matches: |t| t.name_has("legionella pneumophila") },
    GroupRule { group: "Mycobacterium tuberculosis", matches: |t| t.name_has("mycobacterium tuberculosis") },

    // Order-level fallback
    GroupRule { group: ENTEROBACTERALES, matches: |t| t.order == "enterobacterales" },

    // Anaerobes by family / genus
    GroupRule {
        group: ANAEROBIC_BACTERIA,
        matches: |t| {
            t.family == "bacteroidaceae"
                || t.genus_is("bacteroides")
                || t.genus_is("clostridium")
                || t.genus_is("fusobacterium")
                || t.genus_is("prevotella")
        },
    },
];

/// First rule matching `key`, if any
pub fn matching_rule(key: &TaxonKey) -> Option<&'static GroupRule> {
    GROUP_RULES.iter().find(|rule| (rule.matches)(key))
}

/// Resolve an organism to its EUCAST breakpoint group.
///
/// `None` means no breakpoint sheet applies; callers show "no data" rather
/// than treating it as an error.
pub fn map_to_group(organism: &Organism) -> Option<&'static str> {
    matching_rule(&TaxonKey::from_organism(organism)).map(|rule| rule.group)
}
