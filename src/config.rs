use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
}

impl Settings {
    /// `--db` (or `CAREERS_DB`, which clap folds into the flag) wins over the
    /// platform data directory.
    pub fn resolve(db_override: Option<&Path>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => Self::default_db_path(),
        };
        Ok(Self { db_path })
    }

    fn default_db_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "careers") {
            proj_dirs.data_dir().join("careers.db")
        } else {
            PathBuf::from("careers.db")
        }
    }
}

/// Logs go to stderr so command output on stdout stays parseable.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "careers=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let settings = Settings::resolve(Some(Path::new("/tmp/board.db"))).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("/tmp/board.db"));
    }

    #[test]
    fn test_default_path_names_the_database() {
        let settings = Settings::resolve(None).unwrap();
        assert_eq!(settings.db_path.file_name().unwrap(), "careers.db");
    }
}
