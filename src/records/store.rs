//! Load order snapshot and patch output
//!
//! `LoadOrder` is the read side: winning NPC records plus any prior overrides
//! whose game-state data must survive patching. `PatchMod` is the write side:
//! overrides created during the run.

use super::types::{FormKey, Npc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Read access to the records the patcher works on.
pub trait NpcSource {
    /// Winning NPC records in load order priority.
    fn winning_npcs(&self) -> &[Npc];

    /// Override written by an earlier plugin for this record, if any.
    fn prior_override(&self, key: &FormKey) -> Option<&Npc>;

    /// Whether a voice type with this editor id exists in the load order.
    fn voice_type_exists(&self, editor_id: &str) -> bool;
}

/// On-disk snapshot format
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    npcs: Vec<Npc>,
    #[serde(default)]
    prior_overrides: BTreeMap<FormKey, Npc>,
    #[serde(default)]
    voice_types: Vec<String>,
}

/// In-memory load order view
#[derive(Debug, Default, Clone)]
pub struct LoadOrder {
    npcs: Vec<Npc>,
    prior_overrides: HashMap<FormKey, Npc>,
    voice_types: HashSet<String>,
}

impl LoadOrder {
    pub fn new(npcs: Vec<Npc>) -> Self {
        Self {
            npcs,
            ..Default::default()
        }
    }

    /// Load a JSON snapshot exported from the game's load order.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open load order snapshot: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse load order snapshot: {}", path.display()))?;

        info!(
            "Loaded snapshot: {} NPCs, {} prior overrides, {} voice types",
            snapshot.npcs.len(),
            snapshot.prior_overrides.len(),
            snapshot.voice_types.len()
        );

        Ok(Self {
            npcs: snapshot.npcs,
            prior_overrides: snapshot.prior_overrides.into_iter().collect(),
            voice_types: snapshot.voice_types.into_iter().collect(),
        })
    }

    pub fn with_prior_override(mut self, npc: Npc) -> Self {
        self.prior_overrides.insert(npc.form_key.clone(), npc);
        self
    }

    pub fn with_voice_types<I, S>(mut self, voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.voice_types.extend(voices.into_iter().map(Into::into));
        self
    }

    /// The load order as the next run sees it: patched overrides win.
    pub fn with_patch_applied(&self, patch: &PatchMod) -> Self {
        let npcs = self
            .npcs
            .iter()
            .map(|npc| {
                patch
                    .get(&npc.form_key)
                    .cloned()
                    .unwrap_or_else(|| npc.clone())
            })
            .collect();

        Self {
            npcs,
            prior_overrides: self.prior_overrides.clone(),
            voice_types: self.voice_types.clone(),
        }
    }
}

impl NpcSource for LoadOrder {
    fn winning_npcs(&self) -> &[Npc] {
        &self.npcs
    }

    fn prior_override(&self, key: &FormKey) -> Option<&Npc> {
        self.prior_overrides.get(key)
    }

    fn voice_type_exists(&self, editor_id: &str) -> bool {
        self.voice_types.contains(editor_id)
    }
}

/// Overrides produced by a patch run, keyed and ordered by FormKey.
#[derive(Debug, Default, Clone)]
pub struct PatchMod {
    overrides: BTreeMap<FormKey, Npc>,
}

#[derive(Serialize)]
struct PatchFile<'a> {
    overrides: Vec<&'a Npc>,
}

impl PatchMod {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing override for `winning`, or a fresh copy of it.
    pub fn get_or_add_override(&mut self, winning: &Npc) -> &mut Npc {
        self.overrides
            .entry(winning.form_key.clone())
            .or_insert_with(|| winning.clone())
    }

    pub fn get(&self, key: &FormKey) -> Option<&Npc> {
        self.overrides.get(key)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Write all overrides as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        crate::paths::ensure_parent_dirs(path)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create patch file: {}", path.display()))?;

        let out = PatchFile {
            overrides: self.overrides.values().collect(),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &out)
            .with_context(|| format!("Failed to write patch file: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush patch file: {}", path.display()))?;

        info!("Wrote {} overrides to {}", self.overrides.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn npc(id: u32, plugin: &str) -> Npc {
        Npc::new(FormKey::new(id, plugin))
    }

    #[test]
    fn test_snapshot_load() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            r#"{{
                "npcs": [{{"form_key": "000014:Skyrim.esm", "race": "NordRace"}}],
                "prior_overrides": {{"000014:Skyrim.esm": {{"form_key": "000014:Skyrim.esm", "packages": ["000123:Skyrim.esm"]}}}},
                "voice_types": ["FemaleNord"]
            }}"#
        )?;
        tmp.flush()?;

        let lo = LoadOrder::from_json_file(tmp.path())?;
        assert_eq!(lo.winning_npcs().len(), 1);
        let key = FormKey::new(0x14, "Skyrim.esm");
        assert_eq!(lo.prior_override(&key).map(|n| n.packages.len()), Some(1));
        assert!(lo.voice_type_exists("FemaleNord"));
        assert!(!lo.voice_type_exists("MaleNord"));
        Ok(())
    }

    #[test]
    fn test_get_or_add_override_reuses_existing() {
        let mut patch = PatchMod::new();
        let base = npc(0x10, "Mod.esp");

        patch.get_or_add_override(&base).height = 1.2;
        let again = patch.get_or_add_override(&base);
        assert_eq!(again.height, 1.2);
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn test_with_patch_applied() {
        let lo = LoadOrder::new(vec![npc(1, "A.esp"), npc(2, "A.esp")]);
        let mut patch = PatchMod::new();
        patch.get_or_add_override(&lo.winning_npcs()[1]).weight = 75.0;

        let next = lo.with_patch_applied(&patch);
        assert_eq!(next.winning_npcs()[0].weight, 0.0);
        assert_eq!(next.winning_npcs()[1].weight, 75.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_json_reports_full_disk() {
        let mut patch = PatchMod::new();
        patch.get_or_add_override(&npc(1, "A.esp"));
        let err = patch.write_json(Path::new("/dev/full")).unwrap_err();
        assert!(err.to_string().contains("/dev/full"));
    }

    #[test]
    fn test_write_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out/patch.json");
        let mut patch = PatchMod::new();
        patch.get_or_add_override(&npc(2, "B.esp"));
        patch.get_or_add_override(&npc(1, "B.esp"));
        patch.write_json(&path)?;

        let text = std::fs::read_to_string(&path)?;
        let first = text.find("000001:B.esp").unwrap();
        let second = text.find("000002:B.esp").unwrap();
        assert!(first < second);
        Ok(())
    }
}
