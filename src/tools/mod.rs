//! Named operations for external callers.
//!
//! Each operation maps onto one engine call and returns plain serde
//! structures. [`Tools::call`] dispatches by name for the MCP server and the
//! `hri tool` command; failures become an `{"error": {kind, message}}`
//! payload through [`error_payload`].

mod schema;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::error::{HriError, Result};
use crate::model::normalize::normalize_company;
use crate::model::{Candidate, Education, WorkExperience};
use crate::search::fuzzy::similarity;
use crate::search::query::{ComponentScores, MAX_LIMIT, MatchExplanation};
use crate::search::{HybridSearch, SearchControl, SearchQuery, SearchResult, Weights};
use crate::storage::{Database, StructuredField};

pub use schema::{ToolDefinition, definitions};

const ROLE_LIMIT: usize = 10;
const SEMANTIC_LIMIT: usize = 10;
const SKILL_LIMIT: usize = 20;
const EDUCATION_LIMIT: usize = 10;

/// Names accepted by [`Tools::call`], without the optional `_tool` suffix.
pub const TOOL_NAMES: &[&str] = &[
    "search_by_role",
    "semantic_search_experience",
    "find_skill_combinations",
    "get_candidate_details",
    "search_by_education",
    "hybrid_search",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceView {
    pub company: String,
    pub role: String,
    pub dates: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub responsibilities: Vec<String>,
}

impl From<&WorkExperience> for ExperienceView {
    fn from(exp: &WorkExperience) -> Self {
        Self {
            company: exp.company.clone(),
            role: exp.role.clone(),
            dates: exp.dates.clone(),
            start_date: exp.start_date,
            end_date: exp.end_date,
            responsibilities: exp.responsibilities.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationView {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub graduation_date: Option<NaiveDate>,
    pub gpa: Option<f64>,
}

impl From<&Education> for EducationView {
    fn from(edu: &Education) -> Self {
        Self {
            institution: edu.institution.clone(),
            degree: edu.degree.clone(),
            field_of_study: edu.field_of_study.clone(),
            graduation_date: edu.graduation_date,
            gpa: edu.gpa,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceMatch {
    pub candidate_id: String,
    pub name: String,
    pub matched_experience: Vec<ExperienceView>,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub candidate_id: String,
    pub name: String,
    /// Stored skill values that matched, as written on the resume.
    pub matched_skills: Vec<String>,
    /// Number of requested skills matched.
    pub match_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationMatch {
    pub candidate_id: String,
    pub name: String,
    pub matched_education: Vec<EducationView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridHit {
    pub candidate_id: String,
    pub name: String,
    pub score: f32,
    pub scores: ComponentScores,
    pub explanation: MatchExplanation,
    pub degraded: bool,
}

impl From<SearchResult> for HybridHit {
    fn from(result: SearchResult) -> Self {
        Self {
            candidate_id: result.candidate.id,
            name: result.candidate.name,
            score: result.score,
            scores: result.scores,
            explanation: result.explanation,
            degraded: result.degraded,
        }
    }
}

/// Result of a detail lookup: the full record, or an explicit absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateLookup {
    Found(Box<Candidate>),
    Missing { found: bool, candidate_id: String },
}

#[derive(Debug, Deserialize)]
struct RoleArgs {
    keywords: String,
    #[serde(default)]
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SemanticArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct SkillArgs {
    skills: Vec<String>,
    #[serde(default)]
    match_all: bool,
}

#[derive(Debug, Deserialize)]
struct DetailArgs {
    candidate_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct EducationArgs {
    #[serde(default)]
    institution: Option<String>,
    #[serde(default)]
    degree: Option<String>,
}

/// The tool layer over one engine.
pub struct Tools {
    search: Arc<HybridSearch>,
    db: Arc<Database>,
    timeout: Option<Duration>,
}

impl Tools {
    pub fn new(search: Arc<HybridSearch>, db: Arc<Database>) -> Self {
        Self {
            search,
            db,
            timeout: None,
        }
    }

    /// Abort searches that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let mut control = SearchControl::new();
        if let Some(timeout) = self.timeout {
            control = control.with_timeout(timeout);
        }
        self.search.search_with(query, &control)
    }

    fn threshold(&self) -> f32 {
        self.search.settings().fuzzy_threshold
    }

    /// Run `query` a page at a time, keeping what `keep` accepts, until
    /// `wanted` items are kept or the ranking runs out.
    fn collect_pages<T>(
        &self,
        query: &SearchQuery,
        wanted: usize,
        mut keep: impl FnMut(SearchResult) -> Option<T>,
    ) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.run(&query.clone().with_offset(offset).with_limit(MAX_LIMIT))?;
            let exhausted = page.len() < MAX_LIMIT;
            offset += page.len();
            for result in page {
                if let Some(item) = keep(result) {
                    out.push(item);
                    if out.len() == wanted {
                        return Ok(out);
                    }
                }
            }
            if exhausted {
                return Ok(out);
            }
        }
    }

    /// Candidates whose roles or responsibilities match `keywords`,
    /// optionally restricted to experience at `company`.
    pub fn search_by_role(
        &self,
        keywords: &str,
        company: Option<&str>,
    ) -> Result<Vec<ExperienceMatch>> {
        let company = company.map(str::trim).filter(|c| !c.is_empty());
        info!(keywords, company, "search_by_role");
        let mut query = SearchQuery::new()
            .with_roles([keywords])
            .with_weights(Weights::new(0.0, 0.8, 0.2))
            .require_all_filters(true);
        if let Some(company) = company {
            query = query.with_companies([company]);
        }

        let threshold = self.threshold();
        let role = StructuredField::Role.normalize(keywords);
        let company = company.map(normalize_company);
        self.collect_pages(&query, ROLE_LIMIT, |result| {
            let matched_experience: Vec<ExperienceView> = result
                .candidate
                .work_experience
                .iter()
                .filter(|exp| experience_matches(exp, &role, company.as_deref(), threshold))
                .map(ExperienceView::from)
                .collect();
            (!matched_experience.is_empty()).then(|| ExperienceMatch {
                candidate_id: result.candidate.id,
                name: result.candidate.name,
                matched_experience,
                score: result.score,
            })
        })
    }

    /// Semantic search over work-experience narratives.
    pub fn semantic_search_experience(&self, query: &str) -> Result<Vec<ExperienceMatch>> {
        info!(query, "semantic_search_experience");
        let search = SearchQuery::new()
            .with_text(query)
            .with_weights(Weights::new(0.9, 0.1, 0.0))
            .with_limit(SEMANTIC_LIMIT);
        Ok(self
            .run(&search)?
            .into_iter()
            .map(|result| ExperienceMatch {
                matched_experience: result
                    .candidate
                    .work_experience
                    .iter()
                    .map(ExperienceView::from)
                    .collect(),
                candidate_id: result.candidate.id,
                name: result.candidate.name,
                score: result.score,
            })
            .collect())
    }

    /// Candidates with any (or all) of `skills`, most matched first.
    pub fn find_skill_combinations(
        &self,
        skills: &[String],
        match_all: bool,
    ) -> Result<Vec<SkillMatch>> {
        info!(?skills, match_all, "find_skill_combinations");
        let query = SearchQuery::new()
            .with_skills(skills.iter().cloned())
            .match_all_skills(match_all)
            .with_weights(Weights::new(0.0, 0.9, 0.1))
            .with_limit(SKILL_LIMIT);
        let mut out: Vec<SkillMatch> = self
            .run(&query)?
            .into_iter()
            .map(|result| {
                let mut matched_skills: Vec<String> = Vec::new();
                let mut terms: Vec<&str> = Vec::new();
                for hit in &result.explanation.matched_skills {
                    if !matched_skills.contains(&hit.value) {
                        matched_skills.push(hit.value.clone());
                    }
                    if !terms.contains(&hit.term.as_str()) {
                        terms.push(hit.term.as_str());
                    }
                }
                SkillMatch {
                    match_count: terms.len(),
                    candidate_id: result.candidate.id.clone(),
                    name: result.candidate.name.clone(),
                    matched_skills,
                }
            })
            .collect();
        out.sort_by(|a, b| b.match_count.cmp(&a.match_count));
        Ok(out)
    }

    pub fn get_candidate_details(&self, candidate_id: &str) -> Result<CandidateLookup> {
        info!(candidate_id, "get_candidate_details");
        Ok(match self.db.get_by_id(candidate_id.trim())? {
            Some(candidate) => CandidateLookup::Found(Box::new(candidate)),
            None => CandidateLookup::Missing {
                found: false,
                candidate_id: candidate_id.to_string(),
            },
        })
    }

    /// Candidates by institution and/or degree. At least one is required.
    pub fn search_by_education(
        &self,
        institution: Option<&str>,
        degree: Option<&str>,
    ) -> Result<Vec<EducationMatch>> {
        let institution = institution.map(str::trim).filter(|s| !s.is_empty());
        let degree = degree.map(str::trim).filter(|s| !s.is_empty());
        info!(institution, degree, "search_by_education");
        if institution.is_none() && degree.is_none() {
            return Err(HriError::Validation(
                "search_by_education needs an institution or a degree".to_string(),
            ));
        }
        let query = SearchQuery::new()
            .with_education(institution)
            .with_degrees(degree)
            .with_weights(Weights::new(0.0, 0.8, 0.2))
            .require_all_filters(true);

        let threshold = self.threshold();
        let matches = |wanted: Option<&str>, value: &str| {
            wanted.is_none_or(|w| is_match(similarity(w, value), threshold))
        };
        // Institution and degree must hold for the same education entry.
        self.collect_pages(&query, EDUCATION_LIMIT, |result| {
            let matched_education: Vec<EducationView> = result
                .candidate
                .education
                .iter()
                .filter(|edu| matches(institution, &edu.institution) && matches(degree, &edu.degree))
                .map(EducationView::from)
                .collect();
            (!matched_education.is_empty()).then(|| EducationMatch {
                candidate_id: result.candidate.id,
                name: result.candidate.name,
                matched_education,
            })
        })
    }

    /// The engine itself, with explanations.
    pub fn hybrid_search(&self, query: &SearchQuery) -> Result<Vec<HybridHit>> {
        info!(text = ?query.text, "hybrid_search");
        Ok(self.run(query)?.into_iter().map(HybridHit::from).collect())
    }

    /// Dispatch by tool name; the `_tool` suffix is optional.
    pub fn call(&self, name: &str, args: &Value) -> Result<Value> {
        match canonical_name(name) {
            "search_by_role" => {
                let args: RoleArgs = parse_args(args)?;
                to_value(&self.search_by_role(&args.keywords, args.company.as_deref())?)
            }
            "semantic_search_experience" => {
                let args: SemanticArgs = parse_args(args)?;
                to_value(&self.semantic_search_experience(&args.query)?)
            }
            "find_skill_combinations" => {
                let args: SkillArgs = parse_args(args)?;
                to_value(&self.find_skill_combinations(&args.skills, args.match_all)?)
            }
            "get_candidate_details" => {
                let args: DetailArgs = parse_args(args)?;
                to_value(&self.get_candidate_details(&args.candidate_id)?)
            }
            "search_by_education" => {
                let args: EducationArgs = parse_args(args)?;
                to_value(
                    &self.search_by_education(args.institution.as_deref(), args.degree.as_deref())?,
                )
            }
            "hybrid_search" => {
                let query: SearchQuery = parse_args(args)?;
                to_value(&self.hybrid_search(&query)?)
            }
            _ => Err(HriError::Validation(format!(
                "unknown tool {name:?}; available: {}",
                TOOL_NAMES.join(", ")
            ))),
        }
    }
}

/// Same acceptance rule as the structured store's fuzzy filter.
fn is_match(score: f32, threshold: f32) -> bool {
    score >= threshold && score > 0.0
}

/// Whether `exp` has the role (as title or responsibility) and, when given,
/// the company. `role` and `company` are already normalized.
fn experience_matches(
    exp: &WorkExperience,
    role: &str,
    company: Option<&str>,
    threshold: f32,
) -> bool {
    let role_matches = is_match(
        similarity(role, &StructuredField::Role.normalize(&exp.role)),
        threshold,
    ) || exp
        .responsibilities
        .iter()
        .any(|r| is_match(similarity(role, r), threshold));
    role_matches
        && company.is_none_or(|c| {
            is_match(similarity(c, &normalize_company(&exp.company)), threshold)
        })
}

/// Strip the optional `_tool` suffix.
#[must_use]
pub fn canonical_name(name: &str) -> &str {
    name.strip_suffix("_tool").unwrap_or(name)
}

/// The structured error payload returned to tool callers.
#[must_use]
pub fn error_payload(err: &HriError) -> Value {
    json!({
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
        }
    })
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args)
        .map_err(|e| HriError::Validation(format!("invalid tool arguments: {e}")))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::embeddings::HashEmbedder;
    use crate::storage::VectorIndex;
    use crate::storage::vector::{VectorStore, candidate_metadata};

    fn tools(candidates: &[Candidate]) -> Tools {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let vectors = Arc::new(VectorStore::in_memory("t", Arc::new(HashEmbedder::default())));
        for c in candidates {
            db.upsert_candidate(c).unwrap();
            vectors
                .upsert_embedding(&c.id, &c.embedding_text(), candidate_metadata(c))
                .unwrap();
        }
        let search = Arc::new(HybridSearch::new(Arc::clone(&db), vectors));
        Tools::new(search, db)
    }

    fn alice() -> Candidate {
        Candidate::new("c-alice", "Alice")
            .unwrap()
            .with_skills(["Python", "Kubernetes"])
            .with_experience(
                WorkExperience::new("Acme Inc.", "Platform Engineer")
                    .with_responsibility("built scalable cloud infrastructure"),
            )
            .with_experience(WorkExperience::new("Initech", "Support Analyst"))
            .with_education(
                Education::new("Massachusetts Institute of Technology", "BSc Computer Science"),
            )
            .validate()
            .unwrap()
    }

    fn carol() -> Candidate {
        Candidate::new("c-carol", "Carol")
            .unwrap()
            .with_skills(["Go", "Python", "Terraform"])
            .with_experience(WorkExperience::new("Globex", "Site Reliability Engineer"))
            .with_education(Education::new("Stanford University", "MSc Computer Science"))
            .validate()
            .unwrap()
    }

    #[test]
    fn test_semantic_search_finds_alice() {
        let tools = tools(&[alice()]);
        let results = tools.semantic_search_experience("cloud infrastructure").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate_id, "c-alice");
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn test_unknown_skill_returns_empty() {
        let tools = tools(&[alice()]);
        let results = tools
            .find_skill_combinations(&["Java".to_string()], false)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_skill_combinations_count_and_order() {
        let tools = tools(&[alice(), carol()]);
        let skills = vec!["Python".to_string(), "Terraform".to_string()];
        let any = tools.find_skill_combinations(&skills, false).unwrap();
        assert_eq!(any[0].candidate_id, "c-carol");
        assert_eq!(any[0].match_count, 2);
        assert_eq!(any[1].match_count, 1);

        let all = tools.find_skill_combinations(&skills, true).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].matched_skills, vec!["Python", "Terraform"]);
    }

    #[test]
    fn test_search_by_role_returns_matching_experience_only() {
        let tools = tools(&[alice(), carol()]);
        let results = tools.search_by_role("platform engineer", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_experience.len(), 1);
        assert_eq!(results[0].matched_experience[0].company, "Acme Inc.");
    }

    #[test]
    fn test_search_by_role_with_company() {
        let tools = tools(&[alice(), carol()]);
        let results = tools.search_by_role("engineer", Some("Globex")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate_id, "c-carol");
    }

    fn with_roles(id: &str, roles: &[(&str, &str)]) -> Candidate {
        roles
            .iter()
            .fold(Candidate::new(id, id).unwrap(), |c, (company, role)| {
                c.with_experience(WorkExperience::new(*company, *role))
            })
            .validate()
            .unwrap()
    }

    fn with_schools(id: &str, schools: &[(&str, &str)]) -> Candidate {
        schools
            .iter()
            .fold(Candidate::new(id, id).unwrap(), |c, (institution, degree)| {
                c.with_education(Education::new(*institution, *degree))
            })
            .validate()
            .unwrap()
    }

    #[test]
    fn test_search_by_role_checks_every_experience() {
        let dana = with_roles(
            "c-dana",
            &[("Acme", "Platform Engineer"), ("Globex", "Site Reliability Engineer")],
        );
        let tools = tools(&[dana]);

        let at_globex = tools.search_by_role("engineer", Some("Globex")).unwrap();
        assert_eq!(at_globex.len(), 1);
        assert_eq!(at_globex[0].matched_experience.len(), 1);
        assert_eq!(at_globex[0].matched_experience[0].company, "Globex");
        assert_eq!(
            at_globex[0].matched_experience[0].role,
            "Site Reliability Engineer"
        );

        let anywhere = tools.search_by_role("engineer", None).unwrap();
        assert_eq!(anywhere[0].matched_experience.len(), 2);
    }

    #[test]
    fn test_search_by_role_company_matches_do_not_crowd_out_roles() {
        let mut candidates: Vec<Candidate> = (0..10)
            .map(|i| with_roles(&format!("a{i}"), &[("Globex", "Accountant")]))
            .collect();
        candidates.push(with_roles("z-eng", &[("Globex", "Site Reliability Engineer")]));
        let tools = tools(&candidates);

        let results = tools.search_by_role("engineer", Some("Globex")).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["z-eng"]);
    }

    #[test]
    fn test_search_by_role_fills_limit_past_mismatched_pairs() {
        // Engineers elsewhere who merely worked at Globex rank alongside the
        // real match but are dropped per experience.
        let mut candidates: Vec<Candidate> = (0..ROLE_LIMIT + 2)
            .map(|i| {
                with_roles(
                    &format!("a{i:02}"),
                    &[("Initech", "Platform Engineer"), ("Globex", "Accountant")],
                )
            })
            .collect();
        candidates.push(with_roles("z-eng", &[("Globex", "Site Reliability Engineer")]));
        let tools = tools(&candidates);

        let results = tools.search_by_role("engineer", Some("Globex")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate_id, "z-eng");
    }

    #[test]
    fn test_search_by_education_needs_both_fields_on_one_entry() {
        let mut candidates: Vec<Candidate> = (0..6)
            .map(|i| with_schools(&format!("i{i}"), &[("Stanford University", "BA History")]))
            .chain((0..6).map(|i| {
                with_schools(&format!("d{i}"), &[("MIT", "MSc Computer Science")])
            }))
            .collect();
        candidates.push(with_schools(
            "split",
            &[("Stanford University", "BA History"), ("MIT", "MSc Computer Science")],
        ));
        candidates.push(with_schools(
            "z-both",
            &[("Stanford University", "MSc Computer Science")],
        ));
        let tools = tools(&candidates);

        let results = tools
            .search_by_education(Some("Stanford University"), Some("MSc Computer Science"))
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["z-both"]);
        assert_eq!(results[0].matched_education.len(), 1);
    }

    #[test]
    fn test_search_by_education() {
        let tools = tools(&[alice(), carol()]);
        let results = tools
            .search_by_education(Some("Stanford University"), None)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate_id, "c-carol");

        let by_degree = tools.search_by_education(None, Some("Computer Science")).unwrap();
        assert_eq!(by_degree.len(), 2);

        assert!(matches!(
            tools.search_by_education(None, Some("  ")),
            Err(HriError::Validation(_))
        ));
    }

    #[test]
    fn test_get_candidate_details() {
        let tools = tools(&[alice()]);
        let found = tools.call("get_candidate_details", &json!({"candidate_id": "c-alice"})).unwrap();
        assert_eq!(found["name"], "Alice");
        assert_eq!(found["skills"][1], "Kubernetes");

        let missing = tools.call("get_candidate_details", &json!({"candidate_id": "nope"})).unwrap();
        assert_eq!(missing, json!({"found": false, "candidate_id": "nope"}));
    }

    #[test]
    fn test_tool_suffix_alias() {
        let tools = tools(&[alice()]);
        let value = tools
            .call("find_skill_combinations_tool", &json!({"skills": ["Python"]}))
            .unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_bad_arguments_are_validation_errors() {
        let tools = tools(&[alice()]);
        let err = tools.call("search_by_role", &json!({"company": "Acme"})).unwrap_err();
        assert_eq!(err.kind(), "validation");
        let err = tools.call("does_not_exist", &Value::Null).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = error_payload(&HriError::Validation("bad".into()));
        assert_eq!(payload["error"]["kind"], "validation");
        assert!(payload["error"]["message"].as_str().unwrap().contains("bad"));
    }

    #[test]
    fn test_hybrid_search_via_call() {
        let tools = tools(&[alice(), carol()]);
        let value = tools
            .call(
                "hybrid_search",
                &json!({"text": "cloud infrastructure", "skills": ["Python"], "limit": 1}),
            )
            .unwrap();
        let hits = value.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["candidate_id"], "c-alice");
    }

    #[test]
    fn test_hybrid_search_pages_with_offset() {
        let tools = tools(&[alice(), carol()]);
        let page = |offset: usize| {
            tools
                .call(
                    "hybrid_search",
                    &json!({"skills": ["Python"], "limit": 1, "offset": offset}),
                )
                .unwrap()
        };
        assert_eq!(page(0)[0]["candidate_id"], "c-alice");
        assert_eq!(page(1)[0]["candidate_id"], "c-carol");
        assert_eq!(page(2), json!([]));
    }

    #[test]
    fn test_every_tool_has_a_definition() {
        let defs = definitions();
        for name in TOOL_NAMES {
            assert!(defs.iter().any(|d| d.name == *name), "{name}");
        }
    }
}
