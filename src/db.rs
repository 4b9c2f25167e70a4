use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::{Application, Company, CompanyId, JobListing, JobRecord};

/// Persistence side of the import pipeline and the source of board listings.
/// Implementations own tenant isolation: listings never cross companies.
pub trait JobStore {
    /// Inserts all `jobs` for `company` or none of them.
    fn insert_jobs(&self, company: CompanyId, jobs: &[JobRecord]) -> Result<usize>;
    fn list_listings(&self, company: CompanyId) -> Result<Vec<JobListing>>;
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::configure(conn, path.to_path_buf())
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, PathBuf::from(":memory:"))
    }

    fn configure(conn: Connection, path: PathBuf) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!(path = %path.display(), "Opened database");
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL REFERENCES companies(id),
                title TEXT,
                description TEXT,
                location TEXT,
                department TEXT,
                employment_type TEXT,
                experience_level TEXT,
                jobtype TEXT,
                is_remote INTEGER NOT NULL DEFAULT 0,
                salary_range TEXT,
                job_slug TEXT,
                posted_days_ago INTEGER NOT NULL DEFAULT 0,
                skills TEXT NOT NULL DEFAULT '[]',
                last_application_date TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL REFERENCES jobs(id),
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                cv_url TEXT,
                applied_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company_id);
            CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'careers init' first."
            ));
        }
        Ok(())
    }

    // --- Company operations ---

    pub fn create_company(&self, name: &str, slug: &str) -> Result<CompanyId> {
        self.conn
            .execute(
                "INSERT INTO companies (name, slug) VALUES (?1, ?2)",
                params![name, slug],
            )
            .with_context(|| format!("Failed to create company with slug '{}'", slug))?;
        Ok(CompanyId(self.conn.last_insert_rowid()))
    }

    pub fn list_companies(&self) -> Result<Vec<Company>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, slug, name, created_at FROM companies ORDER BY name")?;
        let rows = stmt.query_map([], Self::row_to_company)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list companies")
    }

    pub fn get_company_by_slug(&self, slug: &str) -> Result<Option<Company>> {
        let result = self.conn.query_row(
            "SELECT id, slug, name, created_at FROM companies WHERE slug = ?1",
            [slug],
            Self::row_to_company,
        );
        match result {
            Ok(company) => Ok(Some(company)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`get_company_by_slug`](Self::get_company_by_slug) but a missing company is an error.
    pub fn require_company(&self, slug: &str) -> Result<Company> {
        self.get_company_by_slug(slug)?
            .ok_or_else(|| anyhow!("Company '{}' not found", slug))
    }

    fn row_to_company(row: &rusqlite::Row) -> rusqlite::Result<Company> {
        Ok(Company {
            id: CompanyId(row.get(0)?),
            slug: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    // --- Job operations ---

    pub fn get_listing(&self, id: i64) -> Result<Option<JobListing>> {
        let result = self.conn.query_row(
            "SELECT id, title, description, location, salary_range, job_slug, is_remote,
                    department, employment_type, experience_level
             FROM jobs WHERE id = ?1",
            [id],
            Self::row_to_listing,
        );
        match result {
            Ok(listing) => Ok(Some(listing)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn job_skills(&self, id: i64) -> Result<Vec<String>> {
        let raw: String = self
            .conn
            .query_row("SELECT skills FROM jobs WHERE id = ?1", [id], |row| row.get(0))
            .with_context(|| format!("Job #{} not found", id))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid skills stored for job #{}", id))
    }

    fn row_to_listing(row: &rusqlite::Row) -> rusqlite::Result<JobListing> {
        Ok(JobListing {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            location: row.get(3)?,
            salary_range: row.get(4)?,
            job_slug: row.get(5)?,
            is_remote: row.get(6)?,
            department: row.get(7)?,
            employment_type: row.get(8)?,
            experience_level: row.get(9)?,
        })
    }

    // --- Application operations ---

    pub fn add_application(
        &self,
        job_id: i64,
        name: &str,
        email: &str,
        cv_url: Option<&str>,
    ) -> Result<i64> {
        if name.is_empty() || email.is_empty() {
            bail!("Name and email are required");
        }
        if self.get_listing(job_id)?.is_none() {
            bail!("Job #{} not found", job_id);
        }

        let applied_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO applications (job_id, name, email, cv_url, applied_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![job_id, name, email, cv_url, applied_at],
            )
            .context("Failed to save application")?;
        let id = self.conn.last_insert_rowid();
        info!(job_id, application_id = id, "Application saved");
        Ok(id)
    }

    pub fn list_applications(&self, job_id: i64) -> Result<Vec<Application>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, name, email, cv_url, applied_at
             FROM applications WHERE job_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([job_id], |row| {
            Ok(Application {
                id: row.get(0)?,
                job_id: row.get(1)?,
                name: row.get(2)?,
                email: row.get(3)?,
                cv_url: row.get(4)?,
                applied_at: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list applications")
    }
}

impl JobStore for Database {
    fn insert_jobs(&self, company: CompanyId, jobs: &[JobRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO jobs (company_id, title, description, location, department,
                                   employment_type, experience_level, jobtype, is_remote,
                                   salary_range, job_slug, posted_days_ago, skills,
                                   last_application_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for (index, job) in jobs.iter().enumerate() {
                let skills = serde_json::to_string(&job.skills)?;
                stmt.execute(params![
                    company.0,
                    job.title,
                    job.description,
                    job.location,
                    job.department,
                    job.employment_type,
                    job.experience_level,
                    job.jobtype,
                    job.is_remote,
                    job.salary_range,
                    job.job_slug,
                    job.posted_days_ago,
                    skills,
                    job.last_application_date,
                ])
                .map_err(|e| {
                    warn!(%company, row = index + 1, error = %e, "Job insert rejected");
                    e
                })
                .with_context(|| format!("Failed to insert job row {}", index + 1))?;
            }
        }
        tx.commit()?;
        info!(%company, inserted = jobs.len(), "Imported jobs");
        Ok(jobs.len())
    }

    fn list_listings(&self, company: CompanyId) -> Result<Vec<JobListing>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, location, salary_range, job_slug, is_remote,
                    department, employment_type, experience_level
             FROM jobs WHERE company_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([company.0], Self::row_to_listing)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list jobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, CompanyId) {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let company = db.create_company("Acme", "acme-1234").unwrap();
        (db, company)
    }

    fn job(title: &str, location: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            location: location.to_string(),
            jobtype: "Permanent".to_string(),
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_ensure_initialized() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.ensure_initialized().is_err());
        db.init().unwrap();
        db.init().unwrap();
        assert!(db.ensure_initialized().is_ok());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("careers.db");
        let db = Database::open(&path).unwrap();
        db.init().unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), &path);
    }

    #[test]
    fn test_company_slug_is_unique() {
        let (db, company) = setup();
        assert!(db.create_company("Acme again", "acme-1234").is_err());

        let found = db.require_company("acme-1234").unwrap();
        assert_eq!(found.id, company);
        assert_eq!(found.name, "Acme");
        assert!(db.get_company_by_slug("nope").unwrap().is_none());
        assert!(db.require_company("nope").is_err());
        assert_eq!(db.list_companies().unwrap().len(), 1);
    }

    #[test]
    fn test_insert_and_list_are_tenant_scoped() {
        let (db, acme) = setup();
        let globex = db.create_company("Globex", "globex-0000").unwrap();

        let inserted = db
            .insert_jobs(acme, &[job("Engineer", "Berlin"), job("Designer", "Paris")])
            .unwrap();
        assert_eq!(inserted, 2);
        db.insert_jobs(globex, &[job("Accountant", "Oslo")]).unwrap();

        let listings = db.list_listings(acme).unwrap();
        let titles: Vec<_> = listings.iter().map(|l| l.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["Engineer", "Designer"]);
        assert_eq!(listings[0].description.as_deref(), Some(""));
        assert_eq!(listings[0].is_remote, Some(false));

        assert_eq!(db.list_listings(globex).unwrap().len(), 1);
        assert_eq!(db.job_skills(listings[0].id).unwrap(), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_insert_for_unknown_company_commits_nothing() {
        let (db, acme) = setup();
        let result = db.insert_jobs(CompanyId(999), &[job("A", ""), job("B", "")]);
        assert!(result.is_err());
        assert!(db.list_listings(CompanyId(999)).unwrap().is_empty());
        assert!(db.list_listings(acme).unwrap().is_empty());
    }

    #[test]
    fn test_applications_append_to_job() {
        let (db, acme) = setup();
        db.insert_jobs(acme, &[job("Engineer", "Berlin")]).unwrap();
        let job_id = db.list_listings(acme).unwrap()[0].id;

        db.add_application(job_id, "Ada", "ada@example.com", None).unwrap();
        db.add_application(job_id, "Grace", "grace@example.com", Some("https://cv/grace"))
            .unwrap();

        let applications = db.list_applications(job_id).unwrap();
        assert_eq!(applications.len(), 2);
        assert_eq!(applications[0].name, "Ada");
        assert_eq!(applications[1].cv_url.as_deref(), Some("https://cv/grace"));
        assert!(chrono::DateTime::parse_from_rfc3339(&applications[0].applied_at).is_ok());
    }

    #[test]
    fn test_application_validation() {
        let (db, acme) = setup();
        db.insert_jobs(acme, &[job("Engineer", "Berlin")]).unwrap();
        let job_id = db.list_listings(acme).unwrap()[0].id;

        let err = db.add_application(job_id, "", "a@b.c", None).unwrap_err();
        assert_eq!(err.to_string(), "Name and email are required");
        assert!(db.add_application(job_id, "Ada", "", None).is_err());

        let err = db.add_application(4242, "Ada", "a@b.c", None).unwrap_err();
        assert_eq!(err.to_string(), "Job #4242 not found");
        assert!(db.list_applications(job_id).unwrap().is_empty());
    }
}
