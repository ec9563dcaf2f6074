//! Line-delimited configuration lists.

use super::{ConfigError, PartSet, VisualPart};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Eligible races (required)
pub const RACES_FILE: &str = "races.txt";
/// Face data groups to copy (required)
pub const PARTS_FILE: &str = "parts.txt";
/// Plugins whose NPCs never serve as templates (optional)
pub const BLACKLIST_FILE: &str = "blacklist.txt";
/// Plugins whose NPCs are patched (optional; empty = all)
pub const TARGET_MODS_FILE: &str = "target mods.txt";

/// Parsed lists driving a run
#[derive(Debug, Clone, Default)]
pub struct PatchLists {
    races: HashSet<String>,
    parts: PartSet,
    /// Lower-cased plugin names
    blacklist: HashSet<String>,
    /// Lower-cased plugin names; `None` patches the whole load order
    target_mods: Option<HashSet<String>>,
}

impl PatchLists {
    /// Build lists directly (tests and embedding callers).
    pub fn new<R, S>(races: R, parts: PartSet) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            races: races.into_iter().map(Into::into).collect(),
            parts,
            blacklist: HashSet::new(),
            target_mods: None,
        }
    }

    pub fn with_blacklist<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist = plugins.into_iter().map(|p| p.as_ref().to_lowercase()).collect();
        self
    }

    pub fn with_target_mods<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: HashSet<String> = plugins.into_iter().map(|p| p.as_ref().to_lowercase()).collect();
        self.target_mods = if set.is_empty() { None } else { Some(set) };
        self
    }

    /// Load all four lists from `dir`.
    ///
    /// Races and parts are required; blacklist and target mods default to empty.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let races: HashSet<String> = read_required(&dir.join(RACES_FILE))?.into_iter().collect();

        let parts = read_required(&dir.join(PARTS_FILE))?
            .iter()
            .map(|line| line.parse::<VisualPart>())
            .collect::<Result<PartSet, _>>()?;

        let blacklist = read_optional(&dir.join(BLACKLIST_FILE))?.unwrap_or_default();
        let target_mods = read_optional(&dir.join(TARGET_MODS_FILE))?.unwrap_or_default();

        let lists = Self::new(races, parts)
            .with_blacklist(blacklist)
            .with_target_mods(target_mods);

        info!(
            "Loaded lists: {} races, {} parts, {} blacklisted plugins, {}",
            lists.races.len(),
            lists.parts.len(),
            lists.blacklist.len(),
            match &lists.target_mods {
                Some(mods) => format!("{} target plugins", mods.len()),
                None => "entire load order".to_string(),
            }
        );

        Ok(lists)
    }

    pub fn is_humanoid_race(&self, race: &str) -> bool {
        self.races.contains(race)
    }

    pub fn parts(&self) -> &PartSet {
        &self.parts
    }

    pub fn is_blacklisted(&self, plugin: &str) -> bool {
        self.blacklist.contains(&plugin.to_lowercase())
    }

    /// Whether NPCs defined in `plugin` are patch targets.
    pub fn in_scope(&self, plugin: &str) -> bool {
        match &self.target_mods {
            Some(mods) => mods.contains(&plugin.to_lowercase()),
            None => true,
        }
    }

    /// Sorted race names
    pub fn races(&self) -> Vec<&str> {
        let mut races: Vec<&str> = self.races.iter().map(String::as_str).collect();
        races.sort_unstable();
        races
    }

    /// Sorted target plugins, if restricted
    pub fn target_mods(&self) -> Option<Vec<&str>> {
        self.target_mods.as_ref().map(|mods| {
            let mut mods: Vec<&str> = mods.iter().map(String::as_str).collect();
            mods.sort_unstable();
            mods
        })
    }

    /// Sorted blacklisted plugins
    pub fn blacklist(&self) -> Vec<&str> {
        let mut list: Vec<&str> = self.blacklist.iter().map(String::as_str).collect();
        list.sort_unstable();
        list
    }
}

/// Trimmed, non-empty lines
fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_required(path: &Path) -> Result<Vec<String>, ConfigError> {
    read_optional(path)?.ok_or_else(|| ConfigError::MissingList(path.to_path_buf()))
}

fn read_optional(path: &Path) -> Result<Option<Vec<String>>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(parse_lines(&content)))
}
