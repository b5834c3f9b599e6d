//! Where the CLI keeps remembered credentials

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::warn;

const CREDENTIALS_FILE: &str = "credentials.json";

/// Platform data directory, or an explicit override
pub struct StateDir {
    project_dirs: Option<ProjectDirs>,
    override_dir: Option<PathBuf>,
}

impl StateDir {
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("dev", "Paddock", "Paddock");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Override when given, platform directory otherwise
    pub fn resolve(path: Option<PathBuf>) -> Self {
        path.map_or_else(Self::new, Self::with_override)
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.clone();
        }

        self.project_dirs.as_ref().map_or_else(
            || PathBuf::from("./paddock"),
            |dirs| dirs.data_dir().to_path_buf(),
        )
    }

    /// File backing the persistent ("remember me") scope
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir().join(CREDENTIALS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_override_dir() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = StateDir::resolve(Some(temp_dir.path().to_path_buf()));

        assert_eq!(state_dir.data_dir(), temp_dir.path());
        assert_eq!(
            state_dir.credentials_path(),
            temp_dir.path().join("credentials.json")
        );
    }

    #[test]
    fn test_platform_dir_ends_with_file() {
        let state_dir = StateDir::resolve(None);
        assert!(state_dir.credentials_path().ends_with(CREDENTIALS_FILE));
    }
}
