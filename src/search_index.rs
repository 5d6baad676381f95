//! Search Index for Organism Lookup
//!
//! Name search across the organism table:
//! - Full names (binomials and genus names)
//! - Genus
//! - Species epithet
//!
//! Lowercased copies of the searchable fields are built once at startup, so a
//! query only lowercases itself and walks the index. Each organism receives
//! the score of the first rule in `SCORE_RULES` it satisfies (rules do not
//! accumulate), plus a flat boost for clinically common organisms.

use crate::data::AmrData;
use crate::models::Rank;
use crate::relevancy::{classify, Relevancy, COMMON_PREVALENCE_MAX};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Added to any matching organism with prevalence at or below the common tier
pub const CLINICAL_BOOST: u32 = 10;

/// Lowercased query text and its whitespace-separated words
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    pub text: String,
    pub words: SmallVec<[String; 4]>,
}

impl NormalizedQuery {
    /// `None` for empty or whitespace-only input
    pub fn parse(query: &str) -> Option<Self> {
        let text = query.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        let words = text.split_whitespace().map(str::to_string).collect();
        Some(Self { text, words })
    }
}

/// Lowercased searchable fields of one organism
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub fullname: &'a str,
    pub genus: &'a str,
    pub species: &'a str,
}

pub struct ScoreRule {
    pub score: u32,
    pub matches: fn(&Candidate<'_>, &NormalizedQuery) -> bool,
}

/// Ordered scoring table, first match wins
pub static SCORE_RULES: &[ScoreRule] = &[
    ScoreRule { score: 100, matches: |c, q| c.fullname == q.text },
    ScoreRule { score: 80, matches: |c, q| c.fullname.starts_with(q.text.as_str()) },
    ScoreRule { score: 70, matches: |c, q| c.genus == q.text },
    ScoreRule { score: 60, matches: |c, q| c.species == q.text },
    ScoreRule { score: 50, matches: |c, q| c.fullname.contains(q.text.as_str()) },
    ScoreRule { score: 40, matches: |c, q| q.words.iter().all(|w| c.fullname.contains(w.as_str())) },
    ScoreRule { score: 35, matches: |c, q| c.genus.starts_with(q.text.as_str()) },
    ScoreRule { score: 30, matches: |c, q| c.species.starts_with(q.text.as_str()) },
    ScoreRule {
        score: 20,
        matches: |c, q| {
            q.words
                .iter()
                .any(|w| c.genus.contains(w.as_str()) || c.species.contains(w.as_str()))
        },
    },
];

/// Score one candidate: first matching rule, plus the boost; 0 means no match
pub fn score_candidate(candidate: &Candidate<'_>, prevalence: f64, query: &NormalizedQuery) -> u32 {
    let base = SCORE_RULES
        .iter()
        .find(|rule| (rule.matches)(candidate, query))
        .map_or(0, |rule| rule.score);

    if base > 0 && prevalence <= COMMON_PREVALENCE_MAX {
        base + CLINICAL_BOOST
    } else {
        base
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganismSummary {
    pub code: String,
    pub full_name: String,
    pub rank: Rank,
    pub genus: String,
    pub family: String,
    pub prevalence: f64,
    pub relevancy: Relevancy,
    pub score: u32,
}

struct IndexEntry {
    /// Position in `AmrData::organisms()`
    row: usize,
    fullname: String,
    genus: String,
    species: String,
    prevalence: f64,
}

impl IndexEntry {
    fn candidate(&self) -> Candidate<'_> {
        Candidate {
            fullname: &self.fullname,
            genus: &self.genus,
            species: &self.species,
        }
    }
}

pub struct SearchIndex {
    data: Arc<AmrData>,
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    /// Build the lowercased index over every organism
    pub fn build(data: Arc<AmrData>) -> Self {
        tracing::info!("Building organism search index...");
        let start = std::time::Instant::now();

        let entries: Vec<IndexEntry> = data
            .organisms()
            .iter()
            .enumerate()
            .map(|(row, o)| IndexEntry {
                row,
                fullname: o.fullname.to_lowercase(),
                genus: o.genus.to_lowercase(),
                species: o.species.to_lowercase(),
                prevalence: o.prevalence,
            })
            .collect();

        tracing::info!("Search index built in {:?} ({} organisms)", start.elapsed(), entries.len());

        Self { data, entries }
    }

    /// Ranked organisms matching `query`, at most `limit` of them.
    ///
    /// Higher score first; ties go to the lower (more common) prevalence code,
    /// then to table order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<OrganismSummary> {
        let Some(query) = NormalizedQuery::parse(query) else {
            return Vec::new();
        };

        let mut hits: Vec<(u32, &IndexEntry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = score_candidate(&entry.candidate(), entry.prevalence, &query);
                (score > 0).then_some((score, entry))
            })
            .collect();

        hits.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then_with(|| a.prevalence.total_cmp(&b.prevalence))
        });
        hits.truncate(limit);

        let organisms = self.data.organisms();
        hits.into_iter()
            .map(|(score, entry)| {
                let o = &organisms[entry.row];
                OrganismSummary {
                    code: o.mo.clone(),
                    full_name: o.fullname.clone(),
                    rank: o.rank,
                    genus: o.genus.clone(),
                    family: o.family.clone(),
                    prevalence: o.prevalence,
                    relevancy: classify(o.prevalence),
                    score,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
