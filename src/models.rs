use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque tenant identifier. Every job belongs to exactly one company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub i64);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub slug: String,
    pub name: String,
    pub created_at: String,
}

/// Canonical job posting as produced by the import pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub is_remote: bool,
    pub location: String,
    pub department: String,
    pub employment_type: String,
    pub experience_level: String,
    /// Sourced from the `job_type` column; downstream consumers read it as `jobtype`.
    pub jobtype: String,
    pub salary_range: String,
    pub job_slug: String,
    pub posted_days_ago: i64,
    pub skills: Vec<String>,
    pub last_application_date: Option<String>, // ISO date, never ""
    #[serde(default)]
    pub description: String,
    // attached by the storage side from the route/session
    #[serde(skip_serializing, default)]
    pub company_id: CompanyId,
}

/// Body submitted to the storage collaborator: `{ "jobs": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub jobs: Vec<JobRecord>,
}

/// Job row as fetched for the public board. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub job_slug: Option<String>,
    #[serde(default)]
    pub is_remote: Option<bool>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub name: String,
    pub email: String,
    pub cv_url: Option<String>,
    pub applied_at: String,
}
