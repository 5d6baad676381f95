//! Clinical relevancy classification.
//!
//! Prevalence in the organism table is a categorical code stored as a float,
//! not a measurement: 1.0 marks the most commonly isolated pathogens, 1.15 to
//! 1.25 common ones, 1.5 moderately common, anything else rare. Comparisons
//! are therefore exact.

use serde::Serialize;

pub const VERY_COMMON_PREVALENCE: f64 = 1.0;
pub const COMMON_PREVALENCE_MIN: f64 = 1.15;
pub const COMMON_PREVALENCE_MAX: f64 = 1.25;
pub const MODERATE_PREVALENCE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevancyTier {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relevancy {
    pub tier: RelevancyTier,
    pub label: &'static str,
}

/// Map a prevalence code to its relevancy tier and display label.
#[allow(clippy::float_cmp)]
pub fn classify(prevalence: f64) -> Relevancy {
    if prevalence == VERY_COMMON_PREVALENCE {
        Relevancy { tier: RelevancyTier::High, label: "Very Common" }
    } else if (COMMON_PREVALENCE_MIN..=COMMON_PREVALENCE_MAX).contains(&prevalence) {
        Relevancy { tier: RelevancyTier::High, label: "Common" }
    } else if prevalence == MODERATE_PREVALENCE {
        Relevancy { tier: RelevancyTier::Medium, label: "Moderate" }
    } else {
        Relevancy { tier: RelevancyTier::Low, label: "Less Common" }
    }
}
