//! Profile file discovery.

use std::path::{Path, PathBuf};

use super::types::ProfileFile;
use crate::constants::{APP_NAME, CONFIG_FILENAME, PROJECT_CONFIG_FILENAME};

impl ProfileFile {
    /// Returns the global profile file path.
    ///
    /// Returns `~/.config/nuro/config.toml` on Linux, `None` when the
    /// platform has no config directory.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILENAME))
    }

    /// Picks the profile file to load.
    ///
    /// An explicit path always wins, even if it does not exist (loading it
    /// then fails). Otherwise `.nuro.toml` in `cwd`, then `global`, first
    /// one that exists.
    pub fn locate(explicit: Option<&Path>, cwd: &Path, global: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let project = cwd.join(PROJECT_CONFIG_FILENAME);
        if project.is_file() {
            return Some(project);
        }
        global.filter(|path| path.is_file())
    }
}
