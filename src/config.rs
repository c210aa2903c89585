//! Configuration file handling
//!
//! `featscope.toml` carries the database location and default discovery
//! knobs. CLI flags take precedence over the file, the file over built-in
//! defaults.

use crate::discovery::DiscoveryOptions;
use crate::{Error, RepoId, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatscopeConfig {
    pub database: Option<String>,
    pub repo_id: Option<RepoId>,
    pub max_depth: Option<u32>,
    pub max_symbols: Option<usize>,
    pub min_relevance_score: Option<f64>,
}

impl FeatscopeConfig {
    /// Fold the file-level defaults into a set of discovery options
    pub fn apply_to(&self, options: &mut DiscoveryOptions) {
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        if let Some(max_symbols) = self.max_symbols {
            options.max_symbols = max_symbols;
        }
        if let Some(min_relevance_score) = self.min_relevance_score {
            options.min_relevance_score = min_relevance_score;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("featscope.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".featscope").join("graph.db")
}

pub fn ensure_db_dir(db: &Path) -> Result<()> {
    if let Some(parent) = db.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn load_config(path: Option<&Path>) -> Result<Option<FeatscopeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FeatscopeConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FeatscopeConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }
    let contents = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("featscope.toml");
        let config = FeatscopeConfig {
            database: Some(".featscope/graph.db".into()),
            repo_id: Some(3),
            max_depth: Some(4),
            max_symbols: None,
            min_relevance_score: Some(0.2),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err(), "no silent overwrite");

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.repo_id, Some(3));
        assert_eq!(loaded.max_depth, Some(4));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }

    #[test]
    fn test_apply_to_options() {
        let config = FeatscopeConfig {
            max_depth: Some(2),
            min_relevance_score: Some(0.4),
            ..Default::default()
        };
        let mut options = DiscoveryOptions::default();
        config.apply_to(&mut options);
        assert_eq!(options.max_depth, 2);
        assert_eq!(options.min_relevance_score, 0.4);
        assert_eq!(options.max_symbols, 500, "unset keys keep defaults");
    }
}
