use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the optional settings file next to the executable.
pub const CONFIG_FILE_NAME: &str = "seismic-filter.json";

// ---------------------------------------------------------------------------
// Site configuration
// ---------------------------------------------------------------------------

/// A configured mining site. `blacklist` is a file name under
/// `<dict_dir>/blacklist/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub suffix: String,
    pub blacklist: String,
}

fn default_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            name: "Kirovsky".into(),
            suffix: ".KIR".into(),
            blacklist: "kir.txt".into(),
        },
        SiteConfig {
            name: "Rasvumchorrsky".into(),
            suffix: ".RAS".into(),
            blacklist: "ras.txt".into(),
        },
    ]
}

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dictionary root; relative paths are resolved against the executable
    /// directory.
    #[serde(default = "default_dict_dir")]
    pub dict_dir: PathBuf,

    #[serde(default = "default_sites")]
    pub sites: Vec<SiteConfig>,

    /// Order filtered rows by originating site.
    #[serde(default = "default_true")]
    pub group_by_site: bool,

    /// Convert X/Y/Z with the reference transform in preview and export.
    #[serde(default)]
    pub apply_transform: bool,

    /// Rows shown in the preview table.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Write fractional numbers with a decimal comma on export.
    #[serde(default = "default_true")]
    pub decimal_comma: bool,
}

fn default_dict_dir() -> PathBuf {
    PathBuf::from("dict")
}

fn default_true() -> bool {
    true
}

fn default_preview_rows() -> usize {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dict_dir: default_dict_dir(),
            sites: default_sites(),
            group_by_site: true,
            apply_transform: false,
            preview_rows: default_preview_rows(),
            decimal_comma: true,
        }
    }
}

impl AppConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load `seismic-filter.json` from `base_dir`, falling back to defaults.
    /// `dict_dir` is made absolute against `base_dir`.
    pub fn load_or_default(base_dir: &Path) -> Self {
        let path = base_dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            match Self::from_json_file(&path) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring configuration: {e:#}");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        if config.dict_dir.is_relative() {
            config.dict_dir = base_dir.join(&config.dict_dir);
        }
        config
    }

    /// Directory holding the column-role dictionaries.
    pub fn columns_dir(&self) -> PathBuf {
        self.dict_dir.join("cols")
    }
}

/// Directory of the running executable, or the working directory when it
/// cannot be determined.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites[0].suffix, ".KIR");
        assert_eq!(config.sites[1].blacklist, "ras.txt");
        assert!(config.group_by_site);
        assert_eq!(config.preview_rows, 100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "apply_transform": true, "dict_dir": "dictionaries" }"#,
        )
        .unwrap();

        let config = AppConfig::load_or_default(dir.path());
        assert!(config.apply_transform);
        assert_eq!(config.dict_dir, dir.path().join("dictionaries"));
        assert_eq!(config.sites, default_sites());
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

        let config = AppConfig::load_or_default(dir.path());
        assert!(!config.apply_transform);
        assert_eq!(config.columns_dir(), dir.path().join("dict").join("cols"));
    }
}
