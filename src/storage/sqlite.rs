//! SQLite database layer
//!
//! The structured store is the source of truth for candidate identity. Each
//! nested entity lives in its own typed table keyed by `candidate_id`; rows are
//! always materialized by column name.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HriError, Result};
use crate::model::normalize::{normalize_company, normalize_text};
use crate::model::{
    CANDIDATE_SCHEMA_VERSION, Candidate, ContactInfo, Education, WorkExperience, new_id,
};
use crate::search::fuzzy;
use crate::storage::migrations;

/// Every table that holds rows keyed by candidate id, children first.
pub const CANDIDATE_TABLES: &[&str] = &[
    "work_experience",
    "education",
    "skills",
    "certifications",
    "candidates",
];

/// A structured field that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredField {
    Skill,
    Company,
    Role,
    Institution,
    Degree,
    Responsibility,
}

impl StructuredField {
    const fn table(self) -> &'static str {
        match self {
            Self::Skill => "skills",
            Self::Company | Self::Role | Self::Responsibility => "work_experience",
            Self::Institution | Self::Degree => "education",
        }
    }

    const fn value_column(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Company => "company",
            Self::Role => "role",
            Self::Institution => "institution",
            Self::Degree => "degree",
            Self::Responsibility => "responsibilities",
        }
    }

    const fn normalized_column(self) -> Option<&'static str> {
        match self {
            Self::Skill => Some("normalized_skill"),
            Self::Company => Some("normalized_company"),
            Self::Role => Some("normalized_role"),
            Self::Institution => Some("normalized_institution"),
            Self::Degree => Some("normalized_degree"),
            Self::Responsibility => None,
        }
    }

    /// Normalize a query value the same way the stored column was normalized.
    #[must_use]
    pub fn normalize(self, value: &str) -> String {
        match self {
            Self::Company => normalize_company(value),
            _ => normalize_text(value),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Company => "company",
            Self::Role => "role",
            Self::Institution => "institution",
            Self::Degree => "degree",
            Self::Responsibility => "responsibility",
        }
    }
}

/// One stored value that matched a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub candidate_id: String,
    /// The stored value as written on the resume.
    pub value: String,
    pub score: f32,
}

/// SQLite database wrapper for candidate records
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    schema_version: u32,
}

impl Database {
    /// Open database at the given path, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let db = Self::from_connection(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), schema_version = db.schema_version, "opened structured store");
        Ok(db)
    }

    /// Open a database that must already exist.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(HriError::MissingConfig(format!(
                "structured store not found at {} (run `hri init` first)",
                path.display()
            )));
        }
        Self::open(path)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        Self::configure_pragmas(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            schema_version,
        })
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }

    /// Current schema version after migrations.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert or replace a candidate and all of its nested rows atomically.
    pub fn upsert_candidate(&self, candidate: &Candidate) -> Result<()> {
        let candidate = candidate.clone().validate()?;
        let now = Utc::now().to_rfc3339();
        let contact = candidate.contact_info.clone().unwrap_or_default();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        for table in &CANDIDATE_TABLES[..CANDIDATE_TABLES.len() - 1] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE candidate_id = ?1"),
                [&candidate.id],
            )?;
        }

        tx.execute(
            "INSERT INTO candidates (
                id, name, email, phone, address, linkedin, website, summary,
                schema_version, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                address = excluded.address,
                linkedin = excluded.linkedin,
                website = excluded.website,
                summary = excluded.summary,
                schema_version = excluded.schema_version,
                updated_at = excluded.updated_at",
            params![
                candidate.id,
                candidate.name,
                contact.email,
                contact.phone,
                contact.address,
                contact.linkedin,
                contact.website,
                candidate.summary,
                CANDIDATE_SCHEMA_VERSION,
                now,
            ],
        )?;

        for (position, exp) in candidate.work_experience.iter().enumerate() {
            let responsibilities = serde_json::to_string(&exp.responsibilities)?;
            tx.execute(
                "INSERT INTO work_experience (
                    id, candidate_id, position, company, normalized_company, role,
                    normalized_role, responsibilities, dates, start_date, end_date
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    exp.id,
                    candidate.id,
                    position,
                    exp.company,
                    exp.normalized_company,
                    exp.role,
                    exp.normalized_role,
                    responsibilities,
                    exp.dates,
                    exp.start_date,
                    exp.end_date,
                ],
            )?;
        }

        for (position, edu) in candidate.education.iter().enumerate() {
            tx.execute(
                "INSERT INTO education (
                    id, candidate_id, position, institution, normalized_institution, degree,
                    normalized_degree, field_of_study, dates, start_date, end_date,
                    graduation_date, gpa
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    edu.id,
                    candidate.id,
                    position,
                    edu.institution,
                    edu.normalized_institution,
                    edu.degree,
                    normalize_text(&edu.degree),
                    edu.field_of_study,
                    edu.dates,
                    edu.start_date,
                    edu.end_date,
                    edu.graduation_date,
                    edu.gpa,
                ],
            )?;
        }

        for (position, skill) in candidate.skills.iter().enumerate() {
            tx.execute(
                "INSERT INTO skills (id, candidate_id, position, skill, normalized_skill)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![new_id(), candidate.id, position, skill, normalize_text(skill)],
            )?;
        }

        for (position, cert) in candidate.certifications.iter().enumerate() {
            tx.execute(
                "INSERT INTO certifications (id, candidate_id, position, name)
                 VALUES (?1, ?2, ?3, ?4)",
                params![new_id(), candidate.id, position, cert],
            )?;
        }

        tx.commit()?;
        debug!(candidate_id = %candidate.id, "upserted candidate");
        Ok(())
    }

    /// Remove a candidate from every table that references it.
    ///
    /// Returns whether the candidate existed.
    pub fn delete_candidate(&self, candidate_id: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for table in CANDIDATE_TABLES {
            let column = if *table == "candidates" { "id" } else { "candidate_id" };
            removed += tx.execute(
                &format!("DELETE FROM {table} WHERE {column} = ?1"),
                [candidate_id],
            )?;
        }
        tx.commit()?;
        debug!(candidate_id, rows = removed, "deleted candidate");
        Ok(removed > 0)
    }

    /// Number of rows in any table that reference `candidate_id`.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn references(&self, candidate_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let mut total = 0usize;
        for table in CANDIDATE_TABLES {
            let column = if *table == "candidates" { "id" } else { "candidate_id" };
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
                [candidate_id],
                |row| row.get(0),
            )?;
            total += usize::try_from(count).unwrap_or(0);
        }
        Ok(total)
    }

    /// Fully joined candidate, or `None`.
    pub fn get_by_id(&self, candidate_id: &str) -> Result<Option<Candidate>> {
        let conn = self.conn.lock();
        load_candidate(&conn, candidate_id)
    }

    /// Candidates in insertion order.
    pub fn list_candidates(&self, limit: usize, offset: usize) -> Result<Vec<Candidate>> {
        let conn = self.conn.lock();
        let ids: Vec<String> = {
            let mut stmt =
                conn.prepare("SELECT id FROM candidates ORDER BY rowid LIMIT ?1 OFFSET ?2")?;
            let rows = stmt.query_map(params![to_i64(limit), to_i64(offset)], |row| {
                row.get("id")
            })?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        let mut out = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(candidate) = load_candidate(&conn, id)? {
                out.push(candidate);
            }
        }
        Ok(out)
    }

    /// Every candidate id in insertion order.
    pub fn candidate_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM candidates ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get("id"))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn count_candidates(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Rows whose normalized value equals the normalized `value`.
    pub fn exact_filter(&self, field: StructuredField, value: &str) -> Result<Vec<FieldMatch>> {
        let Some(normalized_column) = field.normalized_column() else {
            return Err(HriError::Validation(format!(
                "{} does not support exact matching",
                field.as_str()
            )));
        };
        let needle = field.normalize(value);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let sql = format!(
            "SELECT t.candidate_id AS candidate_id, t.{value} AS value
             FROM {table} t JOIN candidates c ON c.id = t.candidate_id
             WHERE t.{normalized_column} = ?1
             ORDER BY c.rowid, t.position",
            value = field.value_column(),
            table = field.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([&needle], |row| {
            Ok(FieldMatch {
                candidate_id: row.get("candidate_id")?,
                value: row.get("value")?,
                score: 1.0,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Rows whose similarity to `query` is at least `threshold`, best first.
    ///
    /// Equal scores keep candidate insertion order.
    pub fn fuzzy_filter(
        &self,
        field: StructuredField,
        query: &str,
        threshold: f32,
    ) -> Result<Vec<FieldMatch>> {
        let needle = field.normalize(query);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.scan_field(field)?;
        let mut matches: Vec<FieldMatch> = rows
            .into_iter()
            .filter_map(|(candidate_id, value, comparable)| {
                let score = fuzzy::similarity(&needle, &comparable);
                (score >= threshold && score > 0.0).then_some(FieldMatch {
                    candidate_id,
                    value,
                    score,
                })
            })
            .collect();
        // Stable sort keeps insertion order among equal scores.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    /// (candidate id, display value, comparable value) for every stored value
    /// of `field`, in candidate insertion order.
    fn scan_field(&self, field: StructuredField) -> Result<Vec<(String, String, String)>> {
        let conn = self.conn.lock();
        let comparable = field.normalized_column().unwrap_or(field.value_column());
        let sql = format!(
            "SELECT t.candidate_id AS candidate_id, t.{value} AS value, t.{comparable} AS comparable
             FROM {table} t JOIN candidates c ON c.id = t.candidate_id
             ORDER BY c.rowid, t.position",
            value = field.value_column(),
            table = field.table(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>("candidate_id")?,
                row.get::<_, String>("value")?,
                row.get::<_, String>("comparable")?,
            ))
        })?;
        let rows: Vec<(String, String, String)> = rows.collect::<rusqlite::Result<_>>()?;

        if field != StructuredField::Responsibility {
            return Ok(rows);
        }
        // Responsibilities are a JSON list per experience; match entries individually.
        let mut expanded = Vec::new();
        for (candidate_id, raw, _) in rows {
            for entry in decode_responsibilities(&raw)? {
                expanded.push((candidate_id.clone(), entry.clone(), entry));
            }
        }
        Ok(expanded)
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn decode_responsibilities(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| HriError::structured(format!("corrupt responsibilities column: {e}")))
}

fn load_candidate(conn: &Connection, candidate_id: &str) -> Result<Option<Candidate>> {
    let base = conn
        .query_row(
            "SELECT id, name, email, phone, address, linkedin, website, summary
             FROM candidates WHERE id = ?1",
            [candidate_id],
            |row| {
                let contact = ContactInfo {
                    email: row.get("email")?,
                    phone: row.get("phone")?,
                    address: row.get("address")?,
                    linkedin: row.get("linkedin")?,
                    website: row.get("website")?,
                };
                Ok(Candidate {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    contact_info: (!contact.is_empty()).then_some(contact),
                    education: Vec::new(),
                    work_experience: Vec::new(),
                    skills: Vec::new(),
                    certifications: Vec::new(),
                    summary: row.get("summary")?,
                })
            },
        )
        .optional()?;
    let Some(mut candidate) = base else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT id, company, normalized_company, role, normalized_role, responsibilities,
                dates, start_date, end_date
         FROM work_experience WHERE candidate_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([candidate_id], |row| {
        Ok((row_to_experience(row)?, row.get::<_, String>("responsibilities")?))
    })?;
    for row in rows {
        let (mut exp, responsibilities) = row?;
        exp.responsibilities = decode_responsibilities(&responsibilities)?;
        candidate.work_experience.push(exp);
    }

    let mut stmt = conn.prepare(
        "SELECT id, institution, normalized_institution, degree, field_of_study, dates,
                start_date, end_date, graduation_date, gpa
         FROM education WHERE candidate_id = ?1 ORDER BY position",
    )?;
    candidate.education = stmt
        .query_map([candidate_id], row_to_education)?
        .collect::<rusqlite::Result<_>>()?;

    let mut stmt =
        conn.prepare("SELECT skill FROM skills WHERE candidate_id = ?1 ORDER BY position")?;
    candidate.skills = stmt
        .query_map([candidate_id], |row| row.get("skill"))?
        .collect::<rusqlite::Result<_>>()?;

    let mut stmt =
        conn.prepare("SELECT name FROM certifications WHERE candidate_id = ?1 ORDER BY position")?;
    candidate.certifications = stmt
        .query_map([candidate_id], |row| row.get("name"))?
        .collect::<rusqlite::Result<_>>()?;

    Ok(Some(candidate))
}

fn row_to_experience(row: &Row<'_>) -> rusqlite::Result<WorkExperience> {
    Ok(WorkExperience {
        id: row.get("id")?,
        company: row.get("company")?,
        role: row.get("role")?,
        responsibilities: Vec::new(),
        dates: row.get("dates")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        normalized_company: row.get("normalized_company")?,
        normalized_role: row.get("normalized_role")?,
    })
}

fn row_to_education(row: &Row<'_>) -> rusqlite::Result<Education> {
    Ok(Education {
        id: row.get("id")?,
        institution: row.get("institution")?,
        degree: row.get("degree")?,
        field_of_study: row.get("field_of_study")?,
        dates: row.get("dates")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        graduation_date: row.get("graduation_date")?,
        gpa: row.get("gpa")?,
        normalized_institution: row.get("normalized_institution")?,
    })
}
