//! Canonical candidate record and its nested entities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HriError, Result};
use crate::model::normalize::{normalize_company, normalize_text};

/// Bumped when the persisted shape of a candidate changes.
pub const CANDIDATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl ContactInfo {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.linkedin.is_none()
            && self.website.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field_of_study: Option<String>,
    /// Display string as written on the resume.
    #[serde(default)]
    pub dates: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub graduation_date: Option<NaiveDate>,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub normalized_institution: String,
}

impl Education {
    pub fn new(institution: impl Into<String>, degree: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            institution: institution.into(),
            degree: degree.into(),
            field_of_study: None,
            dates: None,
            start_date: None,
            end_date: None,
            graduation_date: None,
            gpa: None,
            normalized_institution: String::new(),
        }
    }

    #[must_use]
    pub fn with_graduation(mut self, date: Option<NaiveDate>) -> Self {
        self.graduation_date = date;
        self
    }

    #[must_use]
    pub fn with_field_of_study(mut self, field: impl Into<String>) -> Self {
        self.field_of_study = Some(field.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub dates: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub normalized_company: String,
    #[serde(default)]
    pub normalized_role: String,
}

impl WorkExperience {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            company: company.into(),
            role: role.into(),
            responsibilities: Vec::new(),
            dates: None,
            start_date: None,
            end_date: None,
            normalized_company: String::new(),
            normalized_role: String::new(),
        }
    }

    #[must_use]
    pub fn with_responsibility(mut self, text: impl Into<String>) -> Self {
        self.responsibilities.push(text.into());
        self
    }

    #[must_use]
    pub const fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Role, company and responsibilities as one line of prose.
    #[must_use]
    pub fn narrative(&self) -> String {
        let mut line = format!("Role: {} at {}.", self.role, self.company);
        if !self.responsibilities.is_empty() {
            line.push_str(" Responsibilities: ");
            line.push_str(&self.responsibilities.join(" "));
        }
        line
    }
}

/// A validated candidate. Build with [`Candidate::new`] or
/// [`Candidate::from_raw`](crate::model::intake), then call
/// [`Candidate::validate`] before handing it to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Candidate {
    /// Create a candidate with the required fields; fails on blank id or name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        Self {
            id: id.into(),
            name: name.into(),
            contact_info: None,
            education: Vec::new(),
            work_experience: Vec::new(),
            skills: Vec::new(),
            certifications: Vec::new(),
            summary: None,
        }
        .validate()
    }

    #[must_use]
    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact_info = Some(contact);
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
    pub fn with_certifications<I, S>(mut self, certs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.certifications.extend(certs.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_experience(mut self, experience: WorkExperience) -> Self {
        self.work_experience.push(experience);
        self
    }

    #[must_use]
    pub fn with_education(mut self, education: Education) -> Self {
        self.education.push(education);
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Check required fields, reject malformed nested entries, assign missing
    /// nested ids and recompute derived fields.
    ///
    /// Idempotent: validating an already valid candidate changes nothing.
    pub fn validate(mut self) -> Result<Self> {
        self.id = self.id.trim().to_string();
        self.name = self.name.trim().to_string();
        if self.id.is_empty() {
            return Err(HriError::Validation("candidate id is required".to_string()));
        }
        if self.name.is_empty() {
            return Err(HriError::Validation(format!(
                "candidate {} has no name",
                self.id
            )));
        }

        for (idx, edu) in self.education.iter_mut().enumerate() {
            edu.institution = edu.institution.trim().to_string();
            edu.degree = edu.degree.trim().to_string();
            if edu.institution.is_empty() && edu.degree.is_empty() {
                return Err(HriError::Validation(format!(
                    "candidate {}: education[{idx}] has neither institution nor degree",
                    self.id
                )));
            }
            if edu.id.trim().is_empty() {
                edu.id = new_id();
            }
            edu.normalized_institution = normalize_text(&edu.institution);
        }

        for (idx, exp) in self.work_experience.iter_mut().enumerate() {
            exp.company = exp.company.trim().to_string();
            exp.role = exp.role.trim().to_string();
            if exp.company.is_empty() && exp.role.is_empty() {
                return Err(HriError::Validation(format!(
                    "candidate {}: work_experience[{idx}] has neither company nor role",
                    self.id
                )));
            }
            if exp.id.trim().is_empty() {
                exp.id = new_id();
            }
            exp.responsibilities.retain(|r| !r.trim().is_empty());
            exp.normalized_company = normalize_company(&exp.company);
            exp.normalized_role = normalize_text(&exp.role);
        }

        self.skills = dedup_preserving_order(std::mem::take(&mut self.skills));
        self.certifications = dedup_preserving_order(std::mem::take(&mut self.certifications));
        if self.contact_info.as_ref().is_some_and(ContactInfo::is_empty) {
            self.contact_info = None;
        }
        if self.summary.as_ref().is_some_and(|s| s.trim().is_empty()) {
            self.summary = None;
        }

        Ok(self)
    }

    /// Flattened work-experience text used only to produce embeddings.
    ///
    /// Falls back to the summary, then the skill list, for candidates with no
    /// work history so that every candidate gets a non-empty document.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        if !self.work_experience.is_empty() {
            return self
                .work_experience
                .iter()
                .map(WorkExperience::narrative)
                .collect::<Vec<_>>()
                .join("\n");
        }
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        if self.skills.is_empty() {
            self.name.clone()
        } else {
            format!("Skills: {}", self.skills.join(", "))
        }
    }

    /// Flat serializable form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the flat form and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let candidate: Self = serde_json::from_str(json)
            .map_err(|e| HriError::Validation(format!("malformed candidate record: {e}")))?;
        candidate.validate()
    }
}

/// Collision-resistant identifier for nested entities and anonymous candidates.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Candidate {
        Candidate::new("c-alice", "Alice")
            .unwrap()
            .with_skills(["Python", "python", " ", "Rust"])
            .with_experience(
                WorkExperience::new("Acme Inc.", "Platform Engineer")
                    .with_responsibility("built scalable cloud infrastructure at Acme"),
            )
            .validate()
            .unwrap()
    }

    #[test]
    fn test_requires_id_and_name() {
        assert!(matches!(
            Candidate::new("", "Alice"),
            Err(HriError::Validation(_))
        ));
        assert!(matches!(
            Candidate::new("c1", "   "),
            Err(HriError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_assigns_nested_ids() {
        let mut exp = WorkExperience::new("Acme", "Engineer");
        exp.id = String::new();
        let candidate = Candidate::new("c1", "Bob")
            .unwrap()
            .with_experience(exp)
            .validate()
            .unwrap();
        assert!(!candidate.work_experience[0].id.is_empty());
    }

    #[test]
    fn test_nested_ids_are_distinct_for_identical_entries() {
        let candidate = Candidate::new("c1", "Bob")
            .unwrap()
            .with_education(Education::new("MIT", "BSc"))
            .with_education(Education::new("MIT", "BSc"))
            .validate()
            .unwrap();
        assert_ne!(candidate.education[0].id, candidate.education[1].id);
    }

    #[test]
    fn test_rejects_empty_nested_entry() {
        let result = Candidate::new("c1", "Bob")
            .unwrap()
            .with_experience(WorkExperience::new(" ", ""))
            .validate();
        assert!(matches!(result, Err(HriError::Validation(_))));
    }

    #[test]
    fn test_skills_deduplicated_case_insensitively() {
        assert_eq!(alice().skills, vec!["Python", "Rust"]);
    }

    #[test]
    fn test_derived_fields() {
        let candidate = alice();
        assert_eq!(candidate.work_experience[0].normalized_company, "acme");
        assert_eq!(candidate.work_experience[0].normalized_role, "platform engineer");
    }

    #[test]
    fn test_validate_is_idempotent() {
        let once = alice();
        let twice = once.clone().validate().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_embedding_text_uses_work_experience() {
        let text = alice().embedding_text();
        assert!(text.contains("Platform Engineer at Acme Inc."));
        assert!(text.contains("cloud infrastructure"));
    }

    #[test]
    fn test_embedding_text_fallbacks() {
        let bare = Candidate::new("c2", "Dana").unwrap();
        assert_eq!(bare.embedding_text(), "Dana");
        let skilled = bare.with_skills(["Go"]);
        assert_eq!(skilled.embedding_text(), "Skills: Go");
    }

    #[test]
    fn test_json_round_trip_preserves_nulls() {
        let candidate = alice();
        let json = candidate.to_json().unwrap();
        let back = Candidate::from_json(&json).unwrap();
        assert_eq!(back, candidate);
        assert!(back.contact_info.is_none());
        assert!(back.work_experience[0].start_date.is_none());
    }

    #[test]
    fn test_empty_contact_info_collapses_to_none() {
        let candidate = Candidate::new("c1", "Bob")
            .unwrap()
            .with_contact(ContactInfo::default())
            .validate()
            .unwrap();
        assert!(candidate.contact_info.is_none());
    }
}
