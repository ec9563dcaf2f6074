//! Patcher configuration
//!
//! Paths and run settings come from the CLI; the four text lists
//! (races, parts, blacklist, target mods) come from the lists directory.

mod lists;
mod parts;

pub use lists::{PatchLists, BLACKLIST_FILE, PARTS_FILE, RACES_FILE, TARGET_MODS_FILE};
pub use parts::{PartSet, VisualPart};

use crate::records::FormKey;
use std::path::PathBuf;

/// Copy operations queued before a batch is flushed to disk.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1000;

/// Keyword stamped on every patched NPC.
pub const DEFAULT_MARKER_KEYWORD: &str = "000800:SkyFemPatcherKeywords.esp";

/// Height used when the template's is zero.
pub const DEFAULT_HEIGHT: f32 = 1.0;

/// Weight used when the template's is zero.
pub const DEFAULT_WEIGHT: f32 = 50.0;

/// Configuration for a patch run
#[derive(Debug, Clone)]
pub struct PatcherConfig {
    /// Load order snapshot (JSON)
    pub snapshot_path: PathBuf,

    /// Game Data folder (source of FaceGen assets)
    pub data_dir: PathBuf,

    /// Output mod folder (destination of copied FaceGen assets)
    pub output_dir: PathBuf,

    /// Directory holding the text lists
    pub lists_dir: PathBuf,

    /// Where to write the patched overrides
    pub patch_out: PathBuf,

    /// Optional JSON diagnostics report
    pub report_out: Option<PathBuf>,

    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,

    /// Copy batch size
    pub flush_threshold: usize,

    /// Idempotency keyword
    pub marker: FormKey,

    /// Record copy batches without touching disk
    pub dry_run: bool,

    /// Draw a progress bar over the matching loop
    pub show_progress: bool,
}

impl PatcherConfig {
    /// Config with defaults for everything but the paths.
    pub fn new(
        snapshot_path: PathBuf,
        data_dir: PathBuf,
        output_dir: PathBuf,
        lists_dir: PathBuf,
    ) -> Self {
        let patch_out = output_dir.join("facegen_swap_patch.json");
        Self {
            snapshot_path,
            data_dir,
            output_dir,
            lists_dir,
            patch_out,
            report_out: None,
            seed: None,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            marker: default_marker(),
            dry_run: false,
            show_progress: false,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.snapshot_path.is_file() {
            return Err(ConfigError::SnapshotNotFound(self.snapshot_path.clone()));
        }

        if !self.data_dir.is_dir() {
            return Err(ConfigError::DataDirNotFound(self.data_dir.clone()));
        }

        if !self.lists_dir.is_dir() {
            return Err(ConfigError::ListsDirNotFound(self.lists_dir.clone()));
        }

        if self.flush_threshold == 0 {
            return Err(ConfigError::ZeroFlushThreshold);
        }

        Ok(())
    }
}

/// The built-in marker keyword.
pub fn default_marker() -> FormKey {
    FormKey::new(0x000800, "SkyFemPatcherKeywords.esp")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Load order snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("Data directory not found: {0}")]
    DataDirNotFound(PathBuf),

    #[error("Lists directory not found: {0}")]
    ListsDirNotFound(PathBuf),

    #[error("Required list is missing: {0}")]
    MissingList(PathBuf),

    #[error("Failed to read list {path}: {source}")]
    ReadList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown part '{0}' in parts list (expected PNAM, WNAM, QNAM, NAM9, NAMA, Tint Layers, FTST or HCLF)")]
    UnknownPart(String),

    #[error("Flush threshold must be at least 1")]
    ZeroFlushThreshold,
}
