//! Patch run orchestrator
//!
//! Sequences the phases of a run:
//! 1. Cache - probe FaceGen for every template candidate, build pools
//! 2. Match - assign templates, edit overrides, copy FaceGen in batches
//! 3. Write - patched overrides and the optional report

pub mod apply;

use crate::config::{PatchLists, PatcherConfig};
use crate::facegen::FacegenCache;
use crate::matcher::{template_candidates, MatchSession, TemplatePool};
use crate::records::{LoadOrder, NpcSource, PatchMod};
use crate::report::RunReport;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::time::{Duration, Instant};
use tracing::{info, warn};

fn log_phase_metrics(phase: &str, started: Instant) {
    info!(
        "Phase done: phase='{}' elapsed_ms={}",
        phase,
        started.elapsed().as_millis()
    );
}

/// FaceGen coverage of the template candidates, without matching
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProbeStats {
    pub candidates: usize,
    pub complete: usize,
    pub admitted: usize,
    pub races: usize,
}

/// Main patch orchestrator
pub struct Patcher {
    config: PatcherConfig,
    lists: PatchLists,
    load_order: LoadOrder,
}

impl Patcher {
    /// Validate the configuration and load every input.
    pub fn new(config: PatcherConfig) -> Result<Self> {
        config.validate()?;

        let lists = PatchLists::load(&config.lists_dir)?;
        println!(
            "Lists: {} races, {} parts, {} blacklisted plugins",
            lists.races().len(),
            lists.parts().len(),
            lists.blacklist().len()
        );
        match lists.target_mods() {
            Some(mods) => println!("Patching NPCs from: {}", mods.join(", ")),
            None => println!("Patching entire load order"),
        }

        println!("Reading: {}", config.snapshot_path.display());
        let load_order = LoadOrder::from_json_file(&config.snapshot_path)?;

        Ok(Self::with_inputs(config, lists, load_order))
    }

    /// Orchestrator over already-loaded inputs.
    pub fn with_inputs(config: PatcherConfig, lists: PatchLists, load_order: LoadOrder) -> Self {
        Self {
            config,
            lists,
            load_order,
        }
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.config
    }

    /// Run every phase and return the diagnostics.
    ///
    /// The patched overrides are written to `patch_out`; the returned
    /// `PatchMod` is the same set, for callers that chain runs.
    pub fn run(&self) -> Result<(PatchMod, RunReport)> {
        let rng = match self.config.seed {
            Some(seed) => {
                info!("Using RNG seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        if !self.config.dry_run {
            fs::create_dir_all(&self.config.output_dir).with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.config.output_dir.display()
                )
            })?;
        }

        println!("\n=== Phase 1: Cache FaceGen ===\n");
        let started = Instant::now();
        let mut session = MatchSession::new(&self.config, &self.lists, &self.load_order, rng);
        println!(
            "Cached {} templates ({} with complete FaceGen), {} admitted across {} races",
            session.cache().len(),
            session.cache().complete_count(),
            session.pool().template_count(),
            session.pool().race_count()
        );
        if session.cache().is_empty() {
            warn!("No female NPCs of an eligible race found; every target will be unpatched");
        }
        log_phase_metrics("cache", started);

        println!("\n=== Phase 2: Match NPCs ===\n");
        let started = Instant::now();
        let mut patch = PatchMod::new();
        let pb = self.progress_bar()?;
        session.run(&mut patch, &pb)?;
        pb.finish_and_clear();
        log_phase_metrics("match", started);

        let report = session.finish();
        if self.config.dry_run {
            println!(
                "Dry run: {} copies planned in {} batches",
                report.copies.queued,
                report.copies.flushes()
            );
        } else {
            println!(
                "Copied {} FaceGen files in {} batches",
                report.copies.copied,
                report.copies.flushes()
            );
        }

        println!("\n=== Phase 3: Write Patch ===\n");
        let started = Instant::now();
        patch.write_json(&self.config.patch_out)?;
        println!(
            "Wrote {} overrides to {}",
            patch.len(),
            self.config.patch_out.display()
        );
        if let Some(path) = &self.config.report_out {
            report.write_json(path)?;
            println!("Wrote report to {}", path.display());
        }
        log_phase_metrics("write", started);

        Ok((patch, report))
    }

    /// Probe FaceGen and build the pools without matching.
    pub fn probe(&self) -> ProbeStats {
        let npcs = self.load_order.winning_npcs();
        let cache = FacegenCache::build(&self.config.data_dir, template_candidates(npcs, &self.lists));
        let pool = TemplatePool::build(npcs, &cache, &self.lists);

        for (race, count) in pool.summary() {
            println!("  {:<32} {}", race, count);
        }

        ProbeStats {
            candidates: cache.len(),
            complete: cache.complete_count(),
            admitted: pool.template_count(),
            races: pool.race_count(),
        }
    }

    fn progress_bar(&self) -> Result<ProgressBar> {
        if !self.config.show_progress {
            return Ok(ProgressBar::hidden());
        }

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} | {msg}")?
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Ok(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartSet;
    use crate::paths::{self, FaceAsset};
    use crate::records::{FormKey, Npc, NpcFlags};
    use std::path::Path;

    fn npc(id: u32, plugin: &str, race: &str, female: bool) -> Npc {
        let mut npc = Npc::new(FormKey::new(id, plugin));
        npc.race = Some(race.to_string());
        if female {
            npc.configuration.flags = NpcFlags(NpcFlags::FEMALE);
        }
        npc
    }

    fn write_facegen(data_dir: &Path, key: &FormKey) -> Result<()> {
        for asset in FaceAsset::ALL {
            let path = paths::asset_path(data_dir, key, asset);
            paths::ensure_parent_dirs(&path)?;
            fs::write(&path, asset.extension())?;
        }
        Ok(())
    }

    #[test]
    fn test_run_copies_and_writes_patch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let template = npc(0x100, "Women.esp", "NordRace", true);
        let target = npc(0x200, "Skyrim.esm", "NordRace", false);

        let mut config = PatcherConfig::new(
            dir.path().join("snapshot.json"),
            dir.path().join("data"),
            dir.path().join("out"),
            dir.path().join("lists"),
        );
        config.seed = Some(42);
        config.report_out = Some(dir.path().join("out/report.json"));
        write_facegen(&config.data_dir, &template.form_key)?;

        let lists = PatchLists::new(["NordRace"], PartSet::all());
        let load_order = LoadOrder::new(vec![template, target.clone()]);
        let patcher = Patcher::with_inputs(config, lists, load_order);

        let (patch, report) = patcher.run()?;
        assert_eq!(report.primary, 1);
        assert_eq!(report.copies.copied, 2);
        assert_eq!(patch.len(), 1);

        let out = &patcher.config().output_dir;
        for asset in FaceAsset::ALL {
            let dest = paths::asset_path(out, &target.form_key, asset);
            assert_eq!(fs::read_to_string(dest)?, asset.extension());
        }
        assert!(patcher.config().patch_out.is_file());
        assert!(out.join("report.json").is_file());
        Ok(())
    }

    #[test]
    fn test_probe_counts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let complete = npc(0x1, "A.esp", "NordRace", true);
        let partial = npc(0x2, "A.esp", "NordRace", true);

        let config = PatcherConfig::new(
            dir.path().join("snapshot.json"),
            dir.path().join("data"),
            dir.path().join("out"),
            dir.path().join("lists"),
        );
        write_facegen(&config.data_dir, &complete.form_key)?;
        let geometry = paths::asset_path(&config.data_dir, &partial.form_key, FaceAsset::Geometry);
        paths::ensure_parent_dirs(&geometry)?;
        fs::write(&geometry, b"nif")?;

        let lists = PatchLists::new(["NordRace"], PartSet::all());
        let patcher = Patcher::with_inputs(config, lists, LoadOrder::new(vec![complete, partial]));

        assert_eq!(
            patcher.probe(),
            ProbeStats {
                candidates: 2,
                complete: 1,
                admitted: 1,
                races: 1,
            }
        );
        Ok(())
    }
}
