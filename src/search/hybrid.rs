//! Hybrid ranking
//!
//! Drives the structured and vector stores in parallel, unions their
//! candidates, applies the required filters, then ranks by a weighted sum of
//! three axis scores:
//!
//! - semantic: clamped cosine similarity of the query text to the candidate's
//!   embedding document (0 when absent or the vector store is down)
//! - fuzzy: the best similarity over every matched field term
//! - exact: 1 when an exact filter matched or a fuzzy hit was a full match on
//!   a normalized-equal value
//!
//! Equal aggregates order by candidate id, so output is deterministic.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{HriError, Result};
use crate::search::control::SearchControl;
use crate::search::fuzzy::DEFAULT_FUZZY_THRESHOLD;
use crate::search::query::{
    ComponentScores, DEFAULT_LIMIT, FieldHit, MatchExplanation, SearchQuery, SearchResult,
    Weights,
};
use crate::storage::{Database, FieldMatch, MetadataFilter, StructuredField, VectorIndex};

/// Engine defaults, usually taken from `[search]` in config.toml.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub weights: Weights,
    pub fuzzy_threshold: f32,
    /// Semantic hits below this similarity are dropped.
    pub min_semantic_similarity: f32,
    /// The vector store is asked for `limit * candidate_factor` neighbours.
    pub candidate_factor: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            weights: Weights::default(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            min_semantic_similarity: 0.05,
            candidate_factor: 3,
        }
    }
}

/// Per-candidate accumulator while merging sub-query results.
#[derive(Debug, Default)]
struct Accumulator {
    semantic: Option<f32>,
    explanation: MatchExplanation,
}

impl Accumulator {
    fn scores(&self) -> ComponentScores {
        let fuzzy = self
            .explanation
            .hits()
            .map(|hit| hit.score)
            .fold(0.0_f32, f32::max);
        let exact = if self.explanation.hits().any(|hit| hit.exact) {
            1.0
        } else {
            0.0
        };
        ComponentScores {
            semantic: self.semantic.unwrap_or(0.0),
            fuzzy,
            exact,
        }
    }
}

/// Outcome of every structured sub-query.
#[derive(Debug, Default)]
struct StructuredHits {
    skills: Vec<(String, FieldHit)>,
    companies: Vec<(String, FieldHit)>,
    roles: Vec<(String, FieldHit)>,
    education: Vec<(String, FieldHit)>,
    /// Candidates allowed by the exact company filter, when it applies.
    exact_company_ids: Option<HashSet<String>>,
}

/// Hybrid search engine over the two stores.
pub struct HybridSearch {
    db: Arc<Database>,
    vectors: Arc<dyn VectorIndex>,
    settings: SearchSettings,
}

impl HybridSearch {
    pub fn new(db: Arc<Database>, vectors: Arc<dyn VectorIndex>) -> Self {
        Self::with_settings(db, vectors, SearchSettings::default())
    }

    pub fn with_settings(
        db: Arc<Database>,
        vectors: Arc<dyn VectorIndex>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            db,
            vectors,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Search with no deadline.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.search_with(query, &SearchControl::new())
    }

    /// Search, checking `control` between stages.
    pub fn search_with(
        &self,
        query: &SearchQuery,
        control: &SearchControl,
    ) -> Result<Vec<SearchResult>> {
        let query = query.clone().cleaned();
        if !query.has_criteria() {
            return Err(HriError::Validation(
                "query needs free text or at least one filter".to_string(),
            ));
        }
        let limit = query.effective_limit(self.settings.default_limit);
        let weights = query.weights.unwrap_or(self.settings.weights);
        weights.validate()?;
        let weights = weights.normalized();
        let threshold = query.fuzzy_threshold.unwrap_or(self.settings.fuzzy_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(HriError::Validation(format!(
                "fuzzy threshold must be within [0, 1], got {threshold}"
            )));
        }

        control.check()?;
        let (semantic, structured) = rayon::join(
            || self.semantic_hits(&query, query.offset.saturating_add(limit)),
            || self.structured_hits(&query, threshold),
        );
        control.check()?;

        let structured = structured?;
        let (semantic, degraded) = match semantic {
            Ok(hits) => (hits, false),
            Err(err) if err.is_vector_unavailable() => {
                warn!(error = %err, "vector store unavailable, ranking without semantic scores");
                (Vec::new(), true)
            }
            Err(err) => return Err(err),
        };

        let mut merged = merge(&query, semantic, structured);
        let mut ranked: Vec<(String, ComponentScores, f32)> = merged
            .iter()
            .map(|(id, acc)| {
                let scores = acc.scores();
                let aggregate = weights.semantic_weight * scores.semantic
                    + weights.fuzzy_weight * scores.fuzzy
                    + weights.exact_weight * scores.exact;
                (id.clone(), scores, aggregate)
            })
            .collect();
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        debug!(candidates = ranked.len(), limit, "ranked candidates");

        let mut results = Vec::with_capacity(limit.min(ranked.len()));
        let mut skipped = 0;
        for (id, scores, aggregate) in ranked {
            if results.len() == limit {
                break;
            }
            control.check()?;
            // The structured store is the source of truth; stale vector
            // entries with no record are skipped.
            let Some(candidate) = self.db.get_by_id(&id)? else {
                debug!(candidate_id = %id, "skipping vector hit with no structured record");
                continue;
            };
            if skipped < query.offset {
                skipped += 1;
                continue;
            }
            let explanation = merged.remove(&id).map(|acc| acc.explanation).unwrap_or_default();
            results.push(SearchResult {
                candidate,
                score: aggregate,
                scores,
                explanation,
                degraded,
            });
        }
        Ok(results)
    }

    /// Nearest neighbours for the query text; `wanted` counts the skipped
    /// offset as well as the page itself.
    fn semantic_hits(&self, query: &SearchQuery, wanted: usize) -> Result<Vec<(String, f32)>> {
        let Some(text) = query.text.as_deref() else {
            return Ok(Vec::new());
        };
        let k = wanted.saturating_mul(self.settings.candidate_factor.max(1));
        let hits = self.vectors.query(text, &MetadataFilter::new(), k)?;
        Ok(hits
            .into_iter()
            .filter(|hit| hit.similarity >= self.settings.min_semantic_similarity)
            .map(|hit| (hit.candidate_id, hit.similarity))
            .collect())
    }

    fn structured_hits(&self, query: &SearchQuery, threshold: f32) -> Result<StructuredHits> {
        let mut out = StructuredHits::default();

        for term in &query.skills {
            for found in self.db.fuzzy_filter(StructuredField::Skill, term, threshold)? {
                let id = found.candidate_id.clone();
                out.skills.push((id, hit(StructuredField::Skill, term, found)));
            }
        }

        if query.exact_companies && !query.companies.is_empty() {
            let mut allowed = HashSet::new();
            for term in &query.companies {
                for found in self.db.exact_filter(StructuredField::Company, term)? {
                    allowed.insert(found.candidate_id.clone());
                    let id = found.candidate_id.clone();
                    let mut field_hit = hit(StructuredField::Company, term, found);
                    field_hit.exact = true;
                    out.companies.push((id, field_hit));
                }
            }
            out.exact_company_ids = Some(allowed);
        } else {
            for term in &query.companies {
                for found in self.db.fuzzy_filter(StructuredField::Company, term, threshold)? {
                    let id = found.candidate_id.clone();
                    out.companies.push((id, hit(StructuredField::Company, term, found)));
                }
            }
        }

        for term in &query.roles {
            for field in [StructuredField::Role, StructuredField::Responsibility] {
                for found in self.db.fuzzy_filter(field, term, threshold)? {
                    let id = found.candidate_id.clone();
                    out.roles.push((id, hit(field, term, found)));
                }
            }
        }

        for (field, terms) in [
            (StructuredField::Institution, &query.education),
            (StructuredField::Degree, &query.degrees),
        ] {
            for term in terms {
                for found in self.db.fuzzy_filter(field, term, threshold)? {
                    let id = found.candidate_id.clone();
                    out.education.push((id, hit(field, term, found)));
                }
            }
        }

        Ok(out)
    }
}

fn hit(field: StructuredField, term: &str, found: FieldMatch) -> FieldHit {
    let exact = found.score >= 1.0 && field.normalize(term) == field.normalize(&found.value);
    FieldHit {
        field,
        term: term.to_string(),
        value: found.value,
        score: found.score,
        exact,
    }
}

/// Keep the best hit per (candidate, field, term) so explanations stay short.
fn push_best(list: &mut Vec<FieldHit>, new: FieldHit) {
    match list
        .iter_mut()
        .find(|h| h.field == new.field && h.term == new.term)
    {
        Some(existing) if new.score > existing.score => *existing = new,
        Some(_) => {}
        None => list.push(new),
    }
}

fn merge(
    query: &SearchQuery,
    semantic: Vec<(String, f32)>,
    structured: StructuredHits,
) -> HashMap<String, Accumulator> {
    let mut merged: HashMap<String, Accumulator> = HashMap::new();

    for (id, similarity) in semantic {
        let acc = merged.entry(id).or_default();
        acc.semantic = Some(similarity);
        acc.explanation.semantic_similarity = Some(similarity);
    }

    for (id, field_hit) in structured.skills {
        push_best(
            &mut merged.entry(id).or_default().explanation.matched_skills,
            field_hit,
        );
    }
    for (id, field_hit) in structured.companies {
        push_best(
            &mut merged.entry(id).or_default().explanation.matched_companies,
            field_hit,
        );
    }
    for (id, field_hit) in structured.roles {
        push_best(
            &mut merged.entry(id).or_default().explanation.matched_roles,
            field_hit,
        );
    }
    for (id, field_hit) in structured.education {
        push_best(
            &mut merged.entry(id).or_default().explanation.matched_education,
            field_hit,
        );
    }

    if let Some(allowed) = &structured.exact_company_ids {
        merged.retain(|id, _| allowed.contains(id));
    }

    if query.require_all_filters {
        let wants_institution = !query.education.is_empty();
        let wants_degree = !query.degrees.is_empty();
        merged.retain(|_, acc| {
            let found = &acc.explanation;
            let has_education = |field: StructuredField| {
                found.matched_education.iter().any(|h| h.field == field)
            };
            (query.skills.is_empty() || !found.matched_skills.is_empty())
                && (query.companies.is_empty() || !found.matched_companies.is_empty())
                && (query.roles.is_empty() || !found.matched_roles.is_empty())
                && (!wants_institution || has_education(StructuredField::Institution))
                && (!wants_degree || has_education(StructuredField::Degree))
        });
    }

    if query.match_all_skills && !query.skills.is_empty() {
        let wanted: BTreeSet<&str> = query.skills.iter().map(String::as_str).collect();
        merged.retain(|_, acc| {
            let have: BTreeSet<&str> = acc
                .explanation
                .matched_skills
                .iter()
                .map(|h| h.term.as_str())
                .collect();
            wanted.is_subset(&have)
        });
    }

    merged
}
