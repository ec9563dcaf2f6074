//! Batched FaceGen copy executor
//!
//! Copy operations are queued while matching runs and written in batches:
//! once the queue reaches the threshold, and once more at the end of the run.
//! Each flush creates every distinct destination directory first, then copies
//! in queue order, overwriting existing files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One source -> destination file copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOperation {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl CopyOperation {
    pub fn new(source: PathBuf, dest: PathBuf) -> Self {
        Self { source, dest }
    }
}

/// Copy totals for the run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    /// Operations ever queued
    pub queued: usize,
    /// Files written (0 in dry-run mode)
    pub copied: usize,
    /// Distinct directories created or confirmed
    pub dirs_created: usize,
    /// Size of each flushed batch, in order
    pub batches: Vec<usize>,
}

impl CopyStats {
    pub fn flushes(&self) -> usize {
        self.batches.len()
    }
}

/// Queue of pending copies with threshold-triggered flushing
#[derive(Debug)]
pub struct BatchCopier {
    queue: Vec<CopyOperation>,
    threshold: usize,
    dry_run: bool,
    stats: CopyStats,
}

impl BatchCopier {
    pub fn new(threshold: usize) -> Self {
        Self {
            queue: Vec::new(),
            threshold: threshold.max(1),
            dry_run: false,
            stats: CopyStats::default(),
        }
    }

    /// Record batches without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn enqueue(&mut self, op: CopyOperation) {
        self.stats.queued += 1;
        self.queue.push(op);
    }

    /// Pending operations, in queue order.
    pub fn pending(&self) -> &[CopyOperation] {
        &self.queue
    }

    pub fn stats(&self) -> &CopyStats {
        &self.stats
    }

    /// Flush if the queue has reached the threshold. Returns true if it flushed.
    pub fn flush_if_threshold(&mut self) -> Result<bool> {
        if self.queue.len() < self.threshold {
            return Ok(false);
        }
        info!("Performing batch file copy for {} files...", self.queue.len());
        self.flush()?;
        Ok(true)
    }

    /// Flush whatever is queued. Returns the number of operations flushed.
    pub fn flush_all(&mut self) -> Result<usize> {
        if self.queue.is_empty() {
            return Ok(0);
        }
        info!("Performing final batch file copy for {} files...", self.queue.len());
        self.flush()
    }

    fn flush(&mut self) -> Result<usize> {
        let batch = std::mem::take(&mut self.queue);
        let count = batch.len();

        if !self.dry_run {
            let dirs = distinct_parent_dirs(&batch);
            for dir in &dirs {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
            self.stats.dirs_created += dirs.len();

            for op in &batch {
                copy_overwrite(&op.source, &op.dest)?;
                debug!("Copied file to: {}", op.dest.display());
            }
            self.stats.copied += count;
        }

        self.stats.batches.push(count);
        Ok(count)
    }
}

/// Destination directories of a batch, first-seen order, no duplicates.
fn distinct_parent_dirs(batch: &[CopyOperation]) -> Vec<&Path> {
    let mut seen = HashSet::new();
    batch
        .iter()
        .filter_map(|op| op.dest.parent())
        .filter(|dir| !dir.as_os_str().is_empty() && seen.insert(*dir))
        .collect()
}

fn copy_overwrite(source: &Path, dest: &Path) -> Result<()> {
    // reflink refuses to replace an existing file
    let _ = fs::remove_file(dest);
    reflink_copy::reflink_or_copy(source, dest).with_context(|| {
        format!(
            "Failed to copy {} -> {}",
            source.display(),
            dest.display()
        )
    })?;
    Ok(())
}
