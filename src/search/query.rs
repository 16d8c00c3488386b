//! Search query and result types.

use serde::{Deserialize, Serialize};

use crate::error::{HriError, Result};
use crate::model::Candidate;
use crate::storage::StructuredField;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Relative weights of the three scoring axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub semantic_weight: f32,
    pub fuzzy_weight: f32,
    pub exact_weight: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            semantic_weight: 0.5,
            fuzzy_weight: 0.3,
            exact_weight: 0.2,
        }
    }
}

impl Weights {
    #[must_use]
    pub const fn new(semantic_weight: f32, fuzzy_weight: f32, exact_weight: f32) -> Self {
        Self {
            semantic_weight,
            fuzzy_weight,
            exact_weight,
        }
    }

    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("semantic_weight", self.semantic_weight),
            ("fuzzy_weight", self.fuzzy_weight),
            ("exact_weight", self.exact_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(HriError::Validation(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Scale to sum 1. All-zero weights fall back to the defaults.
    #[must_use]
    pub fn normalized(self) -> Self {
        let sum = self.semantic_weight + self.fuzzy_weight + self.exact_weight;
        if sum <= f32::EPSILON {
            return Self::default().normalized();
        }
        Self {
            semantic_weight: self.semantic_weight / sum,
            fuzzy_weight: self.fuzzy_weight / sum,
            exact_weight: self.exact_weight / sum,
        }
    }
}

/// A structured + semantic candidate query.
///
/// Empty filter lists impose no constraint. At least one of `text` or a
/// filter term must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Free text matched against embedded work-experience narratives.
    pub text: Option<String>,
    pub skills: Vec<String>,
    pub companies: Vec<String>,
    pub roles: Vec<String>,
    /// Education institutions.
    #[serde(alias = "institutions")]
    pub education: Vec<String>,
    pub degrees: Vec<String>,
    pub match_all_skills: bool,
    /// Company terms become an exact, required filter.
    pub exact_companies: bool,
    /// Every structured filter present must match: the result set is the
    /// intersection of the filters instead of their union. Institution and
    /// degree count as separate filters.
    pub require_all_filters: bool,
    pub limit: Option<usize>,
    /// Ranked results to skip before the first returned one.
    pub offset: usize,
    pub weights: Option<Weights>,
    pub fuzzy_threshold: Option<f32>,
}

impl SearchQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_companies<I, S>(mut self, companies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.companies.extend(companies.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_education<I, S>(mut self, institutions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.education.extend(institutions.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_degrees<I, S>(mut self, degrees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.degrees.extend(degrees.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn match_all_skills(mut self, yes: bool) -> Self {
        self.match_all_skills = yes;
        self
    }

    #[must_use]
    pub const fn exact_companies(mut self, yes: bool) -> Self {
        self.exact_companies = yes;
        self
    }

    #[must_use]
    pub const fn require_all_filters(mut self, yes: bool) -> Self {
        self.require_all_filters = yes;
        self
    }

    #[must_use]
    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = Some(weights);
        self
    }

    #[must_use]
    pub const fn with_fuzzy_threshold(mut self, threshold: f32) -> Self {
        self.fuzzy_threshold = Some(threshold);
        self
    }

    /// Trim every term and drop blanks, keeping first occurrences.
    #[must_use]
    pub fn cleaned(mut self) -> Self {
        self.text = self
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        for list in [
            &mut self.skills,
            &mut self.companies,
            &mut self.roles,
            &mut self.education,
            &mut self.degrees,
        ] {
            let mut seen = std::collections::HashSet::new();
            let terms = std::mem::take(list);
            list.extend(
                terms
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase())),
            );
        }
        self
    }

    /// True when there is free text or at least one filter term.
    #[must_use]
    pub fn has_criteria(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
            || [
                &self.skills,
                &self.companies,
                &self.roles,
                &self.education,
                &self.degrees,
            ]
            .iter()
            .any(|list| list.iter().any(|t| !t.trim().is_empty()))
    }

    /// Requested limit bounded to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

/// Per-axis scores in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub semantic: f32,
    pub fuzzy: f32,
    pub exact: f32,
}

/// One query term that matched a stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHit {
    pub field: StructuredField,
    /// The query term.
    pub term: String,
    /// The stored value it matched.
    pub value: String,
    pub score: f32,
    /// Exact filter, or a full-score match on normalized-equal values.
    pub exact: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchExplanation {
    pub matched_skills: Vec<FieldHit>,
    pub matched_companies: Vec<FieldHit>,
    pub matched_roles: Vec<FieldHit>,
    /// Institution and degree matches.
    pub matched_education: Vec<FieldHit>,
    pub semantic_similarity: Option<f32>,
}

impl MatchExplanation {
    pub fn hits(&self) -> impl Iterator<Item = &FieldHit> {
        self.matched_skills
            .iter()
            .chain(&self.matched_companies)
            .chain(&self.matched_roles)
            .chain(&self.matched_education)
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(similarity) = self.semantic_similarity {
            parts.push(format!("semantic {similarity:.2}"));
        }
        for hit in self.hits() {
            parts.push(format!(
                "{} {:?}~{:?} {:.2}",
                hit.field.as_str(),
                hit.term,
                hit.value,
                hit.score
            ));
        }
        parts.join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub candidate: Candidate,
    pub score: f32,
    pub scores: ComponentScores,
    pub explanation: MatchExplanation,
    /// The vector store was unavailable; semantic scores are zero.
    pub degraded: bool,
}
