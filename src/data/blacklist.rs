use std::path::Path;

use glob::Pattern;

use super::dictionary::read_entries;
use crate::config::SiteConfig;

// ---------------------------------------------------------------------------
// Blacklist – shell-glob patterns matched against event comments
// ---------------------------------------------------------------------------

/// Read the raw pattern list of a blacklist file.
///
/// Fails soft: an unreadable file yields an empty list (already logged by
/// the dictionary reader).
pub fn load_patterns(path: &Path) -> Vec<String> {
    read_entries(path).unwrap_or_default()
}

/// Compiled comment blacklist of one site.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<Pattern>,
}

impl Blacklist {
    /// Compile patterns, skipping (and logging) malformed ones.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| match Pattern::new(p.as_ref()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    log::warn!("Skipping blacklist pattern '{}': {e}", p.as_ref());
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn load(path: &Path) -> Self {
        Self::from_patterns(load_patterns(path))
    }

    /// True when the trimmed comment matches any pattern (`*`, `?`, `[...]`).
    pub fn matches(&self, comment: &str) -> bool {
        let comment = comment.trim();
        self.patterns.iter().any(|p| p.matches(comment))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SiteDefinition – a mining site recognised by source filename suffix
// ---------------------------------------------------------------------------

/// A named site: rows whose source filename ends with `suffix` belong to it
/// and are subject to its comment blacklist.
#[derive(Debug, Clone)]
pub struct SiteDefinition {
    pub name: String,
    pub suffix: String,
    pub blacklist: Blacklist,
}

impl SiteDefinition {
    pub fn new(name: impl Into<String>, suffix: impl Into<String>, blacklist: Blacklist) -> Self {
        Self {
            name: name.into(),
            suffix: suffix.into(),
            blacklist,
        }
    }

    /// Build a site from configuration, reading its blacklist from
    /// `<dict_dir>/blacklist/<file>` right now.
    pub fn load(config: &SiteConfig, dict_dir: &Path) -> Self {
        let path = dict_dir.join("blacklist").join(&config.blacklist);
        let blacklist = Blacklist::load(&path);
        if blacklist.is_empty() {
            log::info!("Site {}: no blacklist patterns in {}", config.name, path.display());
        }
        log::debug!(
            "Site {} ({}): {} blacklist patterns from {}",
            config.name,
            config.suffix,
            blacklist.len(),
            path.display()
        );
        Self::new(&config.name, &config.suffix, blacklist)
    }

    pub fn owns(&self, source_filename: &str) -> bool {
        source_filename.ends_with(&self.suffix)
    }
}

/// Load every configured site with a fresh copy of its blacklist.
pub fn load_sites(sites: &[SiteConfig], dict_dir: &Path) -> Vec<SiteDefinition> {
    sites.iter().map(|s| SiteDefinition::load(s, dict_dir)).collect()
}
