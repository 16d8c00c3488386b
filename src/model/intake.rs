//! Intake of untrusted extraction output.
//!
//! LLM extraction produces loosely-typed records: fields go missing, lists
//! arrive as comma-separated strings, numbers arrive as strings. Everything is
//! coerced into a [`Candidate`] here before it can touch a store.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HriError, Result};
use crate::model::candidate::{Candidate, ContactInfo, Education, WorkExperience, new_id};
use crate::model::dates::{is_open_ended, parse_date, split_range};

/// A non-fatal gap in an otherwise usable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDataWarning {
    pub candidate_id: String,
    pub field: String,
    pub message: String,
}

impl fmt::Display for PartialDataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.candidate_id, self.field, self.message)
    }
}

/// A validated candidate plus everything that was missing from its source.
#[derive(Debug, Clone)]
pub struct Validated {
    pub candidate: Candidate,
    pub warnings: Vec<PartialDataWarning>,
}

/// Either a single string or a list of (possibly null) values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<Option<serde_json::Value>>),
}

impl StringOrList {
    fn into_strings(self, split_commas: bool) -> Vec<String> {
        match self {
            Self::One(s) if split_commas => s.split([',', ';']).map(str::to_string).collect(),
            Self::One(s) => vec![s],
            Self::Many(values) => values
                .into_iter()
                .flatten()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().split('/').next()?.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEducation {
    pub id: Option<String>,
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub dates: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub graduation_date: Option<String>,
    pub gpa: Option<NumberOrString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWorkExperience {
    pub id: Option<String>,
    pub company: Option<String>,
    #[serde(alias = "title")]
    pub role: Option<String>,
    pub responsibilities: Option<StringOrList>,
    pub dates: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Extraction output as produced by the upstream extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCandidate {
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub candidate_name: Option<String>,
    pub document_type: Option<String>,
    pub contact_info: Option<RawContactInfo>,
    pub education: Option<Vec<Option<RawEducation>>>,
    pub work_experience: Option<Vec<Option<RawWorkExperience>>>,
    pub skills: Option<StringOrList>,
    pub certifications: Option<StringOrList>,
    pub summary: Option<String>,
}

impl RawCandidate {
    /// Parse one record or an array of records from extractor JSON.
    pub fn parse_many(json: &str) -> Result<Vec<Self>> {
        Self::parse_each(json)?.into_iter().collect()
    }

    /// Like [`RawCandidate::parse_many`] but a malformed record only fails
    /// its own slot. Input that is not JSON at all is still an error.
    pub fn parse_each(json: &str) -> Result<Vec<Result<Self>>> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| HriError::Validation(format!("extraction output is not JSON: {e}")))?;
        let records = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value(item).map_err(|e| {
                    HriError::Validation(format!("record {idx} has a malformed structure: {e}"))
                })
            })
            .collect())
    }
}

struct WarningSink {
    candidate_id: String,
    warnings: Vec<PartialDataWarning>,
}

impl WarningSink {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let warning = PartialDataWarning {
            candidate_id: self.candidate_id.clone(),
            field: field.into(),
            message: message.into(),
        };
        warn!(
            candidate_id = %warning.candidate_id,
            field = %warning.field,
            "partial data: {}",
            warning.message
        );
        self.warnings.push(warning);
    }

    fn date(&mut self, field: &str, raw: Option<&str>) -> Option<chrono::NaiveDate> {
        let raw = raw?.trim();
        if raw.is_empty() || is_open_ended(raw) {
            return None;
        }
        let parsed = parse_date(raw);
        if parsed.is_none() {
            self.push(field, format!("unparseable date {raw:?} stored as null"));
        }
        parsed
    }
}

impl Candidate {
    /// Validate and coerce extractor output.
    pub fn from_raw(raw: RawCandidate) -> Result<Validated> {
        let id = raw
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(new_id);
        let name = raw.candidate_name.unwrap_or_default();
        if let Some(doc_type) = raw
            .document_type
            .as_deref()
            .filter(|d| !d.eq_ignore_ascii_case("resume"))
        {
            return Err(HriError::Validation(format!(
                "record {id} is a {doc_type:?} document, not a resume"
            )));
        }

        let mut sink = WarningSink {
            candidate_id: id.clone(),
            warnings: Vec::new(),
        };

        let contact_info = raw.contact_info.map(|c| ContactInfo {
            email: clean(c.email),
            phone: clean(c.phone),
            address: clean(c.address),
            linkedin: clean(c.linkedin),
            website: clean(c.website),
        });
        if contact_info.as_ref().is_none_or(ContactInfo::is_empty) {
            sink.push("contact_info", "no contact information");
        }

        let mut education = Vec::new();
        for (idx, entry) in raw.education.unwrap_or_default().into_iter().enumerate() {
            let Some(entry) = entry else {
                sink.push(format!("education[{idx}]"), "null entry dropped");
                continue;
            };
            education.push(coerce_education(idx, entry, &mut sink));
        }

        let mut work_experience = Vec::new();
        for (idx, entry) in raw.work_experience.unwrap_or_default().into_iter().enumerate() {
            let Some(entry) = entry else {
                sink.push(format!("work_experience[{idx}]"), "null entry dropped");
                continue;
            };
            work_experience.push(coerce_experience(idx, entry, &mut sink));
        }

        let skills = raw
            .skills
            .map(|s| s.into_strings(true))
            .unwrap_or_default();
        if skills.iter().all(|s| s.trim().is_empty()) {
            sink.push("skills", "no skills listed");
        }
        let certifications = raw
            .certifications
            .map(|s| s.into_strings(false))
            .unwrap_or_default();
        if certifications.is_empty() {
            sink.push("certifications", "no certifications listed");
        }

        let candidate = Self {
            id,
            name,
            contact_info,
            education,
            work_experience,
            skills,
            certifications,
            summary: clean(raw.summary),
        }
        .validate()?;

        Ok(Validated {
            candidate,
            warnings: sink.warnings,
        })
    }
}

fn coerce_education(idx: usize, raw: RawEducation, sink: &mut WarningSink) -> Education {
    let field = format!("education[{idx}]");
    let (range_start, range_end) = raw.dates.as_deref().map_or((None, None), split_range);

    let start_date = sink.date(&field, raw.start_date.as_deref().or(range_start));
    let end_date = sink.date(&field, raw.end_date.as_deref().or(range_end));
    let graduation_date = match raw.graduation_date.as_deref() {
        Some(g) => sink.date(&field, Some(g)),
        None => end_date,
    };
    if raw.dates.is_none() && raw.graduation_date.is_none() && raw.start_date.is_none() {
        sink.push(field.clone(), "no dates");
    }
    let gpa = raw.gpa.as_ref().and_then(NumberOrString::as_f64);
    if raw.gpa.is_some() && gpa.is_none() {
        sink.push(field, "unparseable GPA dropped");
    }

    Education {
        id: raw.id.unwrap_or_default(),
        institution: raw.institution.unwrap_or_default(),
        degree: raw.degree.unwrap_or_default(),
        field_of_study: clean(raw.field_of_study),
        dates: clean(raw.dates),
        start_date,
        end_date,
        graduation_date,
        gpa,
        normalized_institution: String::new(),
    }
}

fn coerce_experience(idx: usize, raw: RawWorkExperience, sink: &mut WarningSink) -> WorkExperience {
    let field = format!("work_experience[{idx}]");
    let (range_start, range_end) = raw.dates.as_deref().map_or((None, None), split_range);
    let start_date = sink.date(&field, raw.start_date.as_deref().or(range_start));
    let end_date = sink.date(&field, raw.end_date.as_deref().or(range_end));
    if raw.dates.is_none() && raw.start_date.is_none() {
        sink.push(field, "no dates");
    }

    WorkExperience {
        id: raw.id.unwrap_or_default(),
        company: raw.company.unwrap_or_default(),
        role: raw.role.unwrap_or_default(),
        responsibilities: raw
            .responsibilities
            .map(|r| r.into_strings(false))
            .unwrap_or_default(),
        dates: clean(raw.dates),
        start_date,
        end_date,
        normalized_company: String::new(),
        normalized_role: String::new(),
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
