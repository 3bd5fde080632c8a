//! Locating and loading the `trellis.toml` project configuration.

use std::path::{Path, PathBuf};

use trellis_config::{EngineConfig, CONFIG_FILE_NAME};

use crate::GlobalArgs;

/// A loaded project: its root directory and parsed configuration.
pub struct Project {
    /// Directory containing `trellis.toml`; layout paths are relative to it.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: EngineConfig,
}

/// Walks up from `start` looking for a directory containing `trellis.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project selected by the global CLI args.
///
/// `--config` may name the configuration file itself or its directory.
/// Without it, the current directory and its parents are searched.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let root = p
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                let config = trellis_config::load_config_file(&p)?;
                Ok(Project { root, config })
            } else {
                let config = trellis_config::load_config(&p)?;
                Ok(Project { root: p, config })
            }
        }
        None => {
            let root = find_project_root(&std::env::current_dir()?)?;
            let config = trellis_config::load_config(&root)?;
            Ok(Project { root, config })
        }
    }
}
