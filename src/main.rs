mod config;
mod db;
mod error;
mod import;
mod listing;
mod models;
mod slug;
mod tui;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use config::Settings;
use db::{Database, JobStore};
use listing::{run_query, FilterField, ListingQuery, PageSize};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "careers")]
#[command(about = "Careers page job board - import job spreadsheets and browse the board")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true, env = "CAREERS_DB")]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Bulk import jobs from a .csv, .xlsx or .xls file
    Import {
        /// Company slug
        #[arg(short, long)]
        company: String,

        /// Jobs file
        file: PathBuf,

        /// Print the import request instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// List a company's jobs with search, filters and pagination
    Jobs {
        /// Company slug
        #[arg(short, long)]
        company: String,

        /// Search title, location, department, job type and experience
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value = "")]
        department: String,

        #[arg(long, default_value = "")]
        employment_type: String,

        #[arg(long, default_value = "")]
        experience_level: String,

        /// Rows per page (10, 25 or 50)
        #[arg(long, default_value = "10")]
        page_size: PageSize,

        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show job details
    Show {
        /// Job ID
        id: i64,
    },

    /// Browse a company's job board interactively
    Board {
        /// Company slug
        #[arg(short, long)]
        company: String,
    },

    /// Apply to a job
    Apply {
        /// Job ID
        job_id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Link to an uploaded CV
        #[arg(long)]
        cv_url: Option<String>,
    },

    /// List applications for a job
    Applications {
        /// Job ID
        job_id: i64,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Register a company
    Add {
        /// Company name
        name: String,

        /// Explicit slug (generated from the name otherwise)
        #[arg(long)]
        slug: Option<String>,
    },

    /// List companies
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_tracing(cli.verbose);

    let settings = Settings::resolve(cli.db.as_deref())?;
    debug!(db = %settings.db_path.display(), "Resolved settings");
    let db = Database::open(&settings.db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Company { command } => {
            db.ensure_initialized()?;
            match command {
                CompanyCommands::Add { name, slug } => {
                    let slug = match slug {
                        Some(slug) => slug,
                        None => slug::generate_company_slug(&name)?,
                    };
                    let id = db.create_company(&name, &slug)?;
                    println!("Added company '{}' (ID: {}, slug: {})", name, id, slug);
                }

                CompanyCommands::List => {
                    let companies = db.list_companies()?;
                    if companies.is_empty() {
                        println!("No companies found.");
                    } else {
                        println!("{:<6} {:<30} {:<30} {:<20}", "ID", "NAME", "SLUG", "CREATED");
                        println!("{}", "-".repeat(89));
                        for company in companies {
                            println!(
                                "{:<6} {:<30} {:<30} {:<20}",
                                company.id,
                                truncate(&company.name, 28),
                                truncate(&company.slug, 28),
                                company.created_at
                            );
                        }
                    }
                }
            }
        }

        Commands::Import {
            company,
            file,
            dry_run,
        } => {
            db.ensure_initialized()?;
            let company = db.require_company(&company)?;
            let request = import::normalize_path(&file, company.id)?;

            if dry_run {
                println!("{}", serde_json::to_string_pretty(&request)?);
            } else {
                println!("Parsed {} rows from file.", request.jobs.len());
                if request.jobs.is_empty() {
                    println!("Expected columns: {}", import::EXPECTED_COLUMNS.join(", "));
                }
                let imported = import::submit(&db, company.id, &request)?;
                println!("Imported {} jobs into '{}'.", imported, company.name);
            }
        }

        Commands::Jobs {
            company,
            search,
            location,
            department,
            employment_type,
            experience_level,
            page_size,
            page,
            json,
        } => {
            db.ensure_initialized()?;
            let company = db.require_company(&company)?;
            let listings = db.list_listings(company.id)?;

            let query = ListingQuery::default()
                .with_search(search)
                .with_filter(FilterField::Location, location)
                .with_filter(FilterField::Department, department)
                .with_filter(FilterField::EmploymentType, employment_type)
                .with_filter(FilterField::ExperienceLevel, experience_level)
                .with_page_size(page_size)
                .with_page(page);
            let result = run_query(&listings, &query);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.items.is_empty() {
                println!("No roles match your search or filters.");
            } else {
                println!(
                    "{:<6} {:<28} {:<18} {:<14} {:<12} {:<6}",
                    "ID", "TITLE", "LOCATION", "DEPARTMENT", "TYPE", "REMOTE"
                );
                println!("{}", "-".repeat(89));
                for job in &result.items {
                    println!(
                        "{:<6} {:<28} {:<18} {:<14} {:<12} {:<6}",
                        job.id,
                        truncate(job.title.as_deref().unwrap_or_default(), 26),
                        truncate(job.location.as_deref().unwrap_or_default(), 16),
                        truncate(job.department.as_deref().unwrap_or_default(), 12),
                        truncate(job.employment_type.as_deref().unwrap_or_default(), 10),
                        if job.is_remote == Some(true) { "yes" } else { "" }
                    );
                }
                if let Some((first, last)) = result.item_range() {
                    println!(
                        "\nShowing {}–{} of {} roles. Page {} of {}.",
                        first, last, result.total_matching, result.effective_page, result.total_pages
                    );
                }
            }
        }

        Commands::Show { id } => {
            db.ensure_initialized()?;
            match db.get_listing(id)? {
                Some(job) => {
                    println!("Job #{}", job.id);
                    println!("Title: {}", job.title.as_deref().unwrap_or_default());
                    if let Some(location) = job.location.as_deref().filter(|s| !s.is_empty()) {
                        println!("Location: {}", location);
                    }
                    if let Some(department) = job.department.as_deref().filter(|s| !s.is_empty()) {
                        println!("Department: {}", department);
                    }
                    if let Some(kind) = job.employment_type.as_deref().filter(|s| !s.is_empty()) {
                        println!("Type: {}", kind);
                    }
                    if let Some(level) = job.experience_level.as_deref().filter(|s| !s.is_empty()) {
                        println!("Experience: {}", level);
                    }
                    if job.is_remote == Some(true) {
                        println!("Remote: yes");
                    }
                    if let Some(salary) = job.salary_range.as_deref().filter(|s| !s.is_empty()) {
                        println!("Salary: {}", salary);
                    }
                    let skills = db.job_skills(id)?;
                    if !skills.is_empty() {
                        println!("Skills: {}", skills.join(", "));
                    }
                    if let Some(description) = job.description.as_deref().filter(|s| !s.is_empty())
                    {
                        println!("\n{}", textwrap::fill(description, 80));
                    }
                }
                None => {
                    println!("Job #{} not found.", id);
                }
            }
        }

        Commands::Board { company } => {
            db.ensure_initialized()?;
            let company = db.require_company(&company)?;
            tui::run_board(&db, &company)?;
        }

        Commands::Apply {
            job_id,
            name,
            email,
            cv_url,
        } => {
            db.ensure_initialized()?;
            let id = db.add_application(job_id, &name, &email, cv_url.as_deref())?;
            println!("Application #{} saved for job #{}.", id, job_id);
        }

        Commands::Applications { job_id } => {
            db.ensure_initialized()?;
            db.get_listing(job_id)?
                .ok_or_else(|| anyhow!("Job #{} not found", job_id))?;
            let applications = db.list_applications(job_id)?;
            if applications.is_empty() {
                println!("No applications for job #{}.", job_id);
            } else {
                println!("{:<6} {:<20} {:<28} {:<26}", "ID", "NAME", "EMAIL", "APPLIED");
                println!("{}", "-".repeat(82));
                for application in applications {
                    println!(
                        "{:<6} {:<20} {:<28} {:<26}",
                        application.id,
                        truncate(&application.name, 18),
                        truncate(&application.email, 26),
                        application.applied_at
                    );
                    if let Some(cv) = &application.cv_url {
                        println!("       CV: {}", cv);
                    }
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Senior Backend Engineer", 10), "Senior ...");
        assert_eq!(truncate("Zürich Zürich", 8), "Züric...");
    }

    #[test]
    fn test_cli_parses_listing_flags() {
        let cli = Cli::try_parse_from([
            "careers", "jobs", "--company", "acme-1234", "--search", "rust", "--location",
            "berlin", "--page-size", "25", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Jobs {
                company,
                search,
                location,
                page_size,
                page,
                ..
            } => {
                assert_eq!(company, "acme-1234");
                assert_eq!(search, "rust");
                assert_eq!(location, "berlin");
                assert_eq!(page_size, PageSize::TwentyFive);
                assert_eq!(page, 2);
            }
            _ => panic!("expected jobs command"),
        }

        assert!(Cli::try_parse_from(["careers", "jobs", "-c", "acme", "--page-size", "20"]).is_err());
    }
}
