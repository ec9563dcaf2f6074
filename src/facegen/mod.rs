//! FaceGen existence cache
//!
//! Every potential template gets exactly one pair of filesystem probes, done in
//! parallel before matching starts. The resulting map is read-only afterwards;
//! a record that was never probed reads as "both assets missing".

use crate::paths::{self, FaceAsset};
use crate::records::{FormKey, Npc};

use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Which of a record's two FaceGen files exist in the Data folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacegenPresence {
    pub nif: bool,
    pub dds: bool,
}

impl FacegenPresence {
    pub fn both(nif: bool, dds: bool) -> Self {
        Self { nif, dds }
    }

    pub fn is_complete(&self) -> bool {
        self.nif && self.dds
    }

    pub fn has(&self, asset: FaceAsset) -> bool {
        match asset {
            FaceAsset::Geometry => self.nif,
            FaceAsset::Tint => self.dds,
        }
    }
}

/// Immutable existence map keyed by record
#[derive(Debug, Default, Clone)]
pub struct FacegenCache {
    entries: HashMap<FormKey, FacegenPresence>,
}

impl FacegenCache {
    /// Probe both assets for every candidate under `data_dir`.
    pub fn build<'a, I>(data_dir: &Path, candidates: I) -> Self
    where
        I: IntoIterator<Item = &'a Npc>,
    {
        let keys: Vec<&FormKey> = candidates.into_iter().map(|npc| &npc.form_key).collect();

        let entries: HashMap<FormKey, FacegenPresence> = keys
            .par_iter()
            .map(|key| {
                let presence = FacegenPresence {
                    nif: file_exists(&paths::asset_path(data_dir, key, FaceAsset::Geometry)),
                    dds: file_exists(&paths::asset_path(data_dir, key, FaceAsset::Tint)),
                };
                ((*key).clone(), presence)
            })
            .collect();

        let complete = entries.values().filter(|p| p.is_complete()).count();
        info!(
            "Cached FaceGen existence for {} NPCs ({} complete)",
            entries.len(),
            complete
        );

        Self { entries }
    }

    /// Cache from precomputed entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (FormKey, FacegenPresence)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Presence for `key`; unknown keys read as missing.
    pub fn get(&self, key: &FormKey) -> FacegenPresence {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn complete_count(&self) -> usize {
        self.entries.values().filter(|p| p.is_complete()).count()
    }
}

/// I/O errors count as "absent".
fn file_exists(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        paths::ensure_parent_dirs(path).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_build_probes_both_assets() {
        let dir = tempfile::tempdir().unwrap();
        let full = Npc::new(FormKey::new(0x100, "Mod.esp"));
        let mesh_only = Npc::new(FormKey::new(0x200, "Mod.esp"));
        let none = Npc::new(FormKey::new(0x300, "Other.esp"));

        for asset in FaceAsset::ALL {
            touch(&paths::asset_path(dir.path(), &full.form_key, asset));
        }
        touch(&paths::asset_path(dir.path(), &mesh_only.form_key, FaceAsset::Geometry));

        let cache = FacegenCache::build(dir.path(), [&full, &mesh_only, &none]);
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&full.form_key).is_complete());
        assert_eq!(cache.get(&mesh_only.form_key), FacegenPresence::both(true, false));
        assert_eq!(cache.get(&none.form_key), FacegenPresence::default());
        assert_eq!(cache.complete_count(), 1);
    }

    #[test]
    fn test_unknown_key_reads_missing() {
        let cache = FacegenCache::default();
        let key = FormKey::new(1, "Nope.esp");
        assert!(cache.is_empty());
        assert!(!cache.get(&key).is_complete());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let npc = Npc::new(FormKey::new(0x10, "Mod.esp"));
        fs::create_dir_all(paths::asset_path(dir.path(), &npc.form_key, FaceAsset::Geometry)).unwrap();

        let cache = FacegenCache::build(dir.path(), [&npc]);
        assert!(!cache.get(&npc.form_key).nif);
    }
}
