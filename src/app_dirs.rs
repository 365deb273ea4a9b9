use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("examr"),
            )
        } else {
            ProjectDirs::from("", "", "examr").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// In-flight session entries live here, one file per persisted key.
    pub fn sessions_dir() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("sessions"))
    }

    /// Finished-attempt history database.
    pub fn history_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("history.db"))
    }

    /// Append-only CSV log of finished attempts.
    pub fn results_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("results.csv"))
    }
}
