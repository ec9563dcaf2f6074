//! Template matching engine
//!
//! For every eligible male NPC:
//! 1. Expand the NPC's race to its compatibility cluster
//! 2. Union the template pools of every race in the cluster
//! 3. Shuffle, then take the first template whose FaceGen can be provisioned
//! 4. Otherwise fall back to a template already proven this run
//! 5. Otherwise leave the NPC unpatched
//!
//! All per-run state (proven pool, diagnostics, copy queue, RNG) lives in
//! `MatchSession`; matching is single-threaded and processes targets in
//! load order.

mod pools;

pub use pools::{template_candidates, ProvenPool, TemplatePool};

use crate::config::{PatchLists, PatcherConfig};
use crate::copier::{BatchCopier, CopyOperation};
use crate::facegen::FacegenCache;
use crate::paths::{self, FaceAsset};
use crate::patcher::apply;
use crate::races;
use crate::records::{FormKey, Npc, NpcSource, PatchMod};
use crate::report::RunReport;
use crate::voices::{self, VoiceChoice};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const ARCHIVE_SKIP_REASON: &str = "Mod uses a .bsa archive";
const FILTERED_REASON: &str = "Filtered (Player/Preset)";

/// Why an NPC is or isn't handed to the matching engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Female, non-humanoid, unresolved race, or outside the target plugins
    NotTarget,
    /// The player record or a character-creation preset
    Filtered,
    /// Already carries the marker keyword
    AlreadyPatched,
    Eligible,
}

/// Why a target could not be patched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpatchedReason {
    /// No admitted template for any compatible race
    NoTemplates { race: String },
    /// Every candidate failed and nothing was proven for the race yet
    NoValidTemplates { race: String },
}

impl std::fmt::Display for UnpatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnpatchedReason::NoTemplates { race } => {
                write!(f, "No templates found for race {}", race)
            }
            UnpatchedReason::NoValidTemplates { race } => {
                write!(f, "No valid templates or successful fallbacks for race {}", race)
            }
        }
    }
}

/// Result of matching one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Matched from the shuffled candidate list
    Primary { template: FormKey },
    /// Matched from the proven pool
    Fallback { template: FormKey },
    Unpatched(UnpatchedReason),
}

impl MatchOutcome {
    pub fn template(&self) -> Option<&FormKey> {
        match self {
            MatchOutcome::Primary { template } | MatchOutcome::Fallback { template } => Some(template),
            MatchOutcome::Unpatched(_) => None,
        }
    }
}

/// FaceGen for one (target, template) pair, resolved but not yet queued.
enum Provision {
    /// Vanilla exception: assets assumed present, directories already created
    Assumed,
    Copies(Vec<CopyOperation>),
}

/// Per-run matching state
pub struct MatchSession<'a> {
    config: &'a PatcherConfig,
    lists: &'a PatchLists,
    source: &'a dyn NpcSource,
    cache: FacegenCache,
    pool: TemplatePool<'a>,
    proven: ProvenPool<'a>,
    /// Lower-cased plugin -> has a packed archive
    archives: HashMap<String, bool>,
    copier: BatchCopier,
    rng: StdRng,
    report: RunReport,
}

impl<'a> MatchSession<'a> {
    /// Probe FaceGen for every candidate and build the template pools.
    pub fn new(
        config: &'a PatcherConfig,
        lists: &'a PatchLists,
        source: &'a dyn NpcSource,
        rng: StdRng,
    ) -> Self {
        let npcs = source.winning_npcs();

        info!("Caching facegen file existence...");
        let cache = FacegenCache::build(&config.data_dir, template_candidates(npcs, lists));

        let pool = TemplatePool::build(npcs, &cache, lists);
        for (race, count) in pool.summary() {
            debug!("Found {} female templates for race {}", count, race);
        }

        Self::with_parts(config, lists, source, cache, pool, rng)
    }

    /// Session over a prebuilt cache and pool.
    pub fn with_parts(
        config: &'a PatcherConfig,
        lists: &'a PatchLists,
        source: &'a dyn NpcSource,
        cache: FacegenCache,
        pool: TemplatePool<'a>,
        rng: StdRng,
    ) -> Self {
        let copier = BatchCopier::new(config.flush_threshold).dry_run(config.dry_run);
        Self {
            config,
            lists,
            source,
            cache,
            pool,
            proven: ProvenPool::default(),
            archives: HashMap::new(),
            copier,
            rng,
            report: RunReport::default(),
        }
    }

    /// Seed the fallback pool, e.g. with templates proven by an earlier
    /// session over the same data.
    pub fn with_proven(mut self, proven: ProvenPool<'a>) -> Self {
        self.proven = proven;
        self
    }

    pub fn cache(&self) -> &FacegenCache {
        &self.cache
    }

    pub fn pool(&self) -> &TemplatePool<'a> {
        &self.pool
    }

    pub fn proven(&self) -> &ProvenPool<'a> {
        &self.proven
    }

    pub fn copier(&self) -> &BatchCopier {
        &self.copier
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Decide whether `npc` is a patch target.
    pub fn classify(&self, npc: &Npc) -> TargetStatus {
        let Some(race) = npc.race.as_deref() else {
            return TargetStatus::NotTarget;
        };
        if !self.lists.is_humanoid_race(race)
            || npc.is_female()
            || !self.lists.in_scope(&npc.form_key.plugin)
        {
            return TargetStatus::NotTarget;
        }

        if let Some(edid) = npc.editor_id.as_deref() {
            if edid.eq_ignore_ascii_case("Player") || edid.to_lowercase().contains("preset") {
                return TargetStatus::Filtered;
            }
        }

        if npc.has_keyword(&self.config.marker) {
            return TargetStatus::AlreadyPatched;
        }

        TargetStatus::Eligible
    }

    /// Classify and match every winning NPC, flushing copies as the queue fills.
    pub fn run(&mut self, patch: &mut PatchMod, pb: &ProgressBar) -> Result<()> {
        let source = self.source;
        let npcs = source.winning_npcs();
        pb.set_length(npcs.len() as u64);

        for npc in npcs {
            pb.inc(1);
            match self.classify(npc) {
                TargetStatus::NotTarget => continue,
                TargetStatus::Filtered => {
                    self.report.filtered.insert(npc.label(), FILTERED_REASON.to_string());
                }
                TargetStatus::AlreadyPatched => {
                    self.report.already_patched += 1;
                    debug!("Skipped NPC: {} - already patched", npc.label());
                }
                TargetStatus::Eligible => {
                    self.report.eligible += 1;
                    self.match_target(npc, patch)?;
                    self.copier.flush_if_threshold()?;
                }
            }
            pb.set_message(format!(
                "{} patched, {} unpatched",
                self.report.patched(),
                self.report.unpatched.len()
            ));
        }

        self.copier.flush_all()?;
        Ok(())
    }

    /// Assign a template to one eligible target.
    ///
    /// Queues the FaceGen copies and writes the patched override on success.
    pub fn match_target(&mut self, target: &'a Npc, patch: &mut PatchMod) -> Result<MatchOutcome> {
        let race = target.race.as_deref().unwrap_or_default();
        let compatible = races::compatible_races(race);

        let mut candidates = self.pool.union(&compatible);
        if candidates.is_empty() {
            let reason = UnpatchedReason::NoTemplates {
                race: race.to_string(),
            };
            info!("{} for NPC {}", reason, target.label());
            self.report.unpatched.insert(target.label(), reason.to_string());
            return Ok(MatchOutcome::Unpatched(reason));
        }

        candidates.shuffle(&mut self.rng);

        for candidate in candidates {
            if self.is_archived(&candidate.form_key.plugin) {
                info!(
                    "Skipping template {} from {} for NPC {} - mod uses a .bsa archive",
                    candidate.label(),
                    candidate.form_key.plugin,
                    target.label()
                );
                self.report.skip_template(
                    candidate.label(),
                    &candidate.form_key.plugin,
                    ARCHIVE_SKIP_REASON,
                );
                continue;
            }

            let Some(provision) = self.provision(target, candidate, false)? else {
                continue;
            };

            self.commit(provision);
            self.apply_template(target, candidate, patch);
            self.proven.register(race, candidate);
            self.report.primary += 1;
            debug!(
                "Patched NPC {} with {} (Race: {})",
                target.label(),
                candidate.label(),
                race
            );
            return Ok(MatchOutcome::Primary {
                template: candidate.form_key.clone(),
            });
        }

        if let Some(template) = self.proven.for_race(race).choose(&mut self.rng).copied() {
            if let Some(provision) = self.provision(target, template, true)? {
                self.commit(provision);
                self.apply_template(target, template, patch);
                self.report.fallback += 1;
                info!(
                    "Patched NPC {} with fallback template {} (Race: {})",
                    target.label(),
                    template.label(),
                    race
                );
                return Ok(MatchOutcome::Fallback {
                    template: template.form_key.clone(),
                });
            }
        }

        let reason = UnpatchedReason::NoValidTemplates {
            race: race.to_string(),
        };
        warn!("Failed to patch {} - {}", target.label(), reason);
        self.report.unpatched.insert(target.label(), reason.to_string());
        Ok(MatchOutcome::Unpatched(reason))
    }

    /// Close the session, handing back the report with copy totals.
    pub fn finish(mut self) -> RunReport {
        self.report.copies = self.copier.stats().clone();
        self.report
    }

    /// One filesystem probe per plugin for its packed archive.
    ///
    /// Keyed case-insensitively: the first spelling seen decides the answer
    /// for every casing of that plugin name.
    fn is_archived(&mut self, plugin: &str) -> bool {
        let data_dir = &self.config.data_dir;
        *self
            .archives
            .entry(plugin.to_lowercase())
            .or_insert_with(|| paths::archive_path(data_dir, plugin).is_file())
    }

    /// Resolve the FaceGen copies for `target` from `template`.
    ///
    /// `trusted` templates come from the proven pool and are queued without
    /// consulting the cache. Returns `None` if either asset is missing.
    fn provision(&self, target: &Npc, template: &Npc, trusted: bool) -> Result<Option<Provision>> {
        let data_dir = &self.config.data_dir;
        let output_dir = &self.config.output_dir;

        let template_race = template.race.as_deref().unwrap_or_default();
        if races::is_exception(template_race, &template.form_key) {
            if !self.config.dry_run {
                for asset in FaceAsset::ALL {
                    let dest = paths::asset_path(output_dir, &target.form_key, asset);
                    paths::ensure_parent_dirs(&dest)
                        .with_context(|| format!("Failed to create directory for {}", dest.display()))?;
                }
            }
            debug!(
                "Assumed FaceGen for vanilla template {} (NPC {})",
                template.label(),
                target.label()
            );
            return Ok(Some(Provision::Assumed));
        }

        let presence = self.cache.get(&template.form_key);
        let mut copies = Vec::with_capacity(2);
        for asset in FaceAsset::ALL {
            let source = paths::asset_path(data_dir, &template.form_key, asset);
            if trusted || presence.has(asset) {
                let dest = paths::asset_path(output_dir, &target.form_key, asset);
                copies.push(CopyOperation::new(source, dest));
            } else {
                warn!(
                    "No {} found for template {} at {}",
                    asset,
                    template.label(),
                    source.display()
                );
            }
        }

        if copies.len() == FaceAsset::ALL.len() {
            Ok(Some(Provision::Copies(copies)))
        } else {
            Ok(None)
        }
    }

    fn commit(&mut self, provision: Provision) {
        if let Provision::Copies(copies) = provision {
            for op in copies {
                self.copier.enqueue(op);
            }
        }
    }

    /// Write the template's face onto the target's override.
    fn apply_template(&mut self, target: &Npc, template: &Npc, patch: &mut PatchMod) {
        let patched = patch.get_or_add_override(target);

        if let Some(prior) = self.source.prior_override(&target.form_key) {
            apply::carry_forward(patched, prior);
        }

        apply::copy_face(patched, template, self.lists.parts());
        patched.configuration.flags.set_female();

        if let (Some(voice), Some(race)) = (target.voice.as_deref(), target.race.as_deref()) {
            match voices::remap_voice(voice, race, &mut self.rng) {
                Some(choice) if self.source.voice_type_exists(choice.voice()) => {
                    if let VoiceChoice::Fallback(v) = choice {
                        debug!("No female voice mapping for {} - used fallback {}", voice, v);
                    }
                    patched.voice = Some(choice.voice().to_string());
                }
                Some(choice) => {
                    warn!(
                        "Voice type {} not found in load order for {}",
                        choice.voice(),
                        target.label()
                    );
                }
                None => debug!("No fallback voices defined for race {} ({})", race, target.label()),
            }
        }

        apply::copy_body(patched, template);
        apply::mark_patched(patched, &self.config.marker);
    }
}
