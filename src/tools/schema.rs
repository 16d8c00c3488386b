//! Tool descriptions and JSON input schemas.

use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "search_by_role",
            "Fuzzy search over job titles and responsibilities, optionally limited to one company",
            json!({
                "type": "object",
                "properties": {
                    "keywords": {
                        "type": "string",
                        "description": "Role or responsibility keywords"
                    },
                    "company": {
                        "type": "string",
                        "description": "Only return experience at this company"
                    }
                },
                "required": ["keywords"]
            }),
        ),
        tool(
            "semantic_search_experience",
            "Semantic search across work-experience narratives, matching meaning rather than exact words",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language description of the experience"
                    }
                },
                "required": ["query"]
            }),
        ),
        tool(
            "find_skill_combinations",
            "Find candidates with any (or all) of the given skills",
            json!({
                "type": "object",
                "properties": {
                    "skills": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Skills to look for"
                    },
                    "match_all": {
                        "type": "boolean",
                        "description": "Require every skill instead of any",
                        "default": false
                    }
                },
                "required": ["skills"]
            }),
        ),
        tool(
            "get_candidate_details",
            "Full profile of one candidate by id",
            json!({
                "type": "object",
                "properties": {
                    "candidate_id": {
                        "type": "string",
                        "description": "Candidate identifier"
                    }
                },
                "required": ["candidate_id"]
            }),
        ),
        tool(
            "search_by_education",
            "Find candidates by institution and/or degree",
            json!({
                "type": "object",
                "properties": {
                    "institution": {
                        "type": "string",
                        "description": "University, college or school name"
                    },
                    "degree": {
                        "type": "string",
                        "description": "Degree or field, e.g. \"BSc Computer Science\""
                    }
                }
            }),
        ),
        tool(
            "hybrid_search",
            "Combined structured and semantic search with per-axis scores and match explanations",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Free text for semantic matching"},
                    "skills": {"type": "array", "items": {"type": "string"}},
                    "companies": {"type": "array", "items": {"type": "string"}},
                    "roles": {"type": "array", "items": {"type": "string"}},
                    "education": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Institutions"
                    },
                    "degrees": {"type": "array", "items": {"type": "string"}},
                    "match_all_skills": {"type": "boolean", "default": false},
                    "exact_companies": {
                        "type": "boolean",
                        "default": false,
                        "description": "Company terms become an exact, required filter"
                    },
                    "require_all_filters": {
                        "type": "boolean",
                        "default": false,
                        "description": "Every given filter must match instead of any"
                    },
                    "limit": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10},
                    "offset": {
                        "type": "integer",
                        "minimum": 0,
                        "default": 0,
                        "description": "Ranked results to skip, for paging"
                    },
                    "weights": {
                        "type": "object",
                        "properties": {
                            "semantic_weight": {"type": "number", "minimum": 0},
                            "fuzzy_weight": {"type": "number", "minimum": 0},
                            "exact_weight": {"type": "number", "minimum": 0}
                        }
                    },
                    "fuzzy_threshold": {"type": "number", "minimum": 0, "maximum": 1}
                }
            }),
        ),
    ]
}
