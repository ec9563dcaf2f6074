//! Run diagnostics and summary output.

use crate::copier::CopyStats;

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A template passed over during matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTemplate {
    pub plugin: String,
    pub reason: String,
}

/// Everything worth telling the user after a run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    /// Targets that reached the matching engine
    pub eligible: usize,
    /// Targets already carrying the marker keyword
    pub already_patched: usize,
    /// Matched from the shuffled candidate list
    pub primary: usize,
    /// Matched from the proven pool
    pub fallback: usize,
    /// Template label -> why it was passed over
    pub skipped_templates: BTreeMap<String, SkippedTemplate>,
    /// Target label -> why it was excluded before matching
    pub filtered: BTreeMap<String, String>,
    /// Target label -> why no template could be assigned
    pub unpatched: BTreeMap<String, String>,
    pub copies: CopyStats,
}

impl RunReport {
    pub fn patched(&self) -> usize {
        self.primary + self.fallback
    }

    pub fn skip_template(&mut self, label: String, plugin: &str, reason: &str) {
        self.skipped_templates.insert(
            label,
            SkippedTemplate {
                plugin: plugin.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    /// Human-readable end-of-run summary
    pub fn print_summary(&self) {
        if !self.skipped_templates.is_empty() {
            println!("\nSummary of Skipped Templates:");
            for (template, skipped) in &self.skipped_templates {
                println!(
                    "- Template: {}, Mod: {}, Reason: {}",
                    template, skipped.plugin, skipped.reason
                );
            }
            println!(
                "If these templates cause problems, add their plugins to the blacklist."
            );
        }

        if !self.filtered.is_empty() {
            println!("\nFiltered NPCs (Excluded from Patching):");
            for (npc, reason) in &self.filtered {
                println!("- NPC: {}, Reason: {}", npc, reason);
            }
        }

        if !self.unpatched.is_empty() {
            println!("\nUnpatched NPCs:");
            for (npc, reason) in &self.unpatched {
                println!("- NPC: {}, Reason: {}", npc, reason);
            }
        }

        println!("\n=== Patch Summary ===");
        println!(
            "NPCs:    {} patched ({} primary, {} fallback) of {} eligible, {} already patched",
            self.patched(),
            self.primary,
            self.fallback,
            self.eligible,
            self.already_patched
        );
        println!(
            "Files:   {} queued, {} copied, {} batches",
            self.copies.queued,
            self.copies.copied,
            self.copies.flushes()
        );
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        crate::paths::ensure_parent_dirs(path)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create report: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush report: {}", path.display()))?;
        Ok(())
    }
}
