//! Versioned schema setup driven by `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::info;

use crate::error::{HriError, Result};

pub const SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[&str] = &[
    // v1: typed candidate tables
    r"
    CREATE TABLE IF NOT EXISTS candidates (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        linkedin TEXT,
        website TEXT,
        summary TEXT,
        schema_version INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS work_experience (
        id TEXT PRIMARY KEY,
        candidate_id TEXT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        company TEXT NOT NULL,
        normalized_company TEXT NOT NULL,
        role TEXT NOT NULL,
        normalized_role TEXT NOT NULL,
        responsibilities TEXT NOT NULL,
        dates TEXT,
        start_date TEXT,
        end_date TEXT
    );

    CREATE TABLE IF NOT EXISTS education (
        id TEXT PRIMARY KEY,
        candidate_id TEXT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        institution TEXT NOT NULL,
        normalized_institution TEXT NOT NULL,
        degree TEXT NOT NULL,
        normalized_degree TEXT NOT NULL,
        field_of_study TEXT,
        dates TEXT,
        start_date TEXT,
        end_date TEXT,
        graduation_date TEXT,
        gpa REAL
    );

    CREATE TABLE IF NOT EXISTS skills (
        id TEXT PRIMARY KEY,
        candidate_id TEXT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        skill TEXT NOT NULL,
        normalized_skill TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS certifications (
        id TEXT PRIMARY KEY,
        candidate_id TEXT NOT NULL REFERENCES candidates(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        name TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_candidates_name ON candidates(name);
    CREATE INDEX IF NOT EXISTS idx_work_candidate ON work_experience(candidate_id);
    CREATE INDEX IF NOT EXISTS idx_work_company ON work_experience(normalized_company);
    CREATE INDEX IF NOT EXISTS idx_work_role ON work_experience(normalized_role);
    CREATE INDEX IF NOT EXISTS idx_education_candidate ON education(candidate_id);
    CREATE INDEX IF NOT EXISTS idx_education_institution ON education(normalized_institution);
    CREATE INDEX IF NOT EXISTS idx_skills_candidate ON skills(candidate_id);
    CREATE INDEX IF NOT EXISTS idx_skills_skill ON skills(normalized_skill);
    CREATE INDEX IF NOT EXISTS idx_certifications_candidate ON certifications(candidate_id);
    ",
];

/// Apply every migration newer than the database's `user_version`.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if current > SCHEMA_VERSION {
        return Err(HriError::structured(format!(
            "database schema v{current} is newer than supported v{SCHEMA_VERSION}"
        )));
    }

    for (idx, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = idx + 1;
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))?;
        info!(version, "applied schema migration");
    }

    Ok(SCHEMA_VERSION)
}
