//! FaceGen path conventions
//!
//! Both the game's Data folder and the output mod folder use the same layout:
//! - `meshes/actors/character/facegendata/facegeom/<plugin>/00<id>.nif`
//! - `textures/actors/character/facegendata/facetint/<plugin>/00<id>.dds`

use crate::records::FormKey;
use std::path::{Path, PathBuf};

const FACEGEOM_DIR: [&str; 5] = ["meshes", "actors", "character", "facegendata", "facegeom"];
const FACETINT_DIR: [&str; 5] = ["textures", "actors", "character", "facegendata", "facetint"];

/// The two FaceGen assets every NPC face needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceAsset {
    /// Head mesh (.nif)
    Geometry,
    /// Face tint (.dds)
    Tint,
}

impl FaceAsset {
    pub const ALL: [FaceAsset; 2] = [FaceAsset::Geometry, FaceAsset::Tint];

    fn dir(self) -> &'static [&'static str; 5] {
        match self {
            FaceAsset::Geometry => &FACEGEOM_DIR,
            FaceAsset::Tint => &FACETINT_DIR,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FaceAsset::Geometry => "nif",
            FaceAsset::Tint => "dds",
        }
    }
}

impl std::fmt::Display for FaceAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceAsset::Geometry => write!(f, "facegeom"),
            FaceAsset::Tint => write!(f, "facetint"),
        }
    }
}

/// File name for a record's asset: `00<id>.<ext>`
pub fn asset_file_name(key: &FormKey, asset: FaceAsset) -> String {
    format!("00{}.{}", key.id_string(), asset.extension())
}

/// Path of `key`'s asset under `root` (a Data folder or an output folder).
pub fn asset_path(root: &Path, key: &FormKey, asset: FaceAsset) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(asset.dir());
    path.push(&key.plugin);
    path.push(asset_file_name(key, asset));
    path
}

/// Packed archive that would hold a plugin's loose assets: `Mod.esp` -> `Mod.bsa`.
pub fn archive_path(data_dir: &Path, plugin: &str) -> PathBuf {
    let stem = Path::new(plugin)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| plugin.to_string());
    data_dir.join(format!("{}.bsa", stem))
}

/// Create parent directories for a path if they don't exist
pub fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
