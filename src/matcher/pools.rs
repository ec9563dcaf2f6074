//! Template pools: admitted female templates grouped by race.

use crate::config::PatchLists;
use crate::facegen::FacegenCache;
use crate::races;
use crate::records::Npc;

use std::collections::HashMap;
use tracing::info;

/// Female NPCs of an eligible race; the candidate set for the existence cache.
pub fn template_candidates<'a, 'l>(
    npcs: &'a [Npc],
    lists: &'l PatchLists,
) -> impl Iterator<Item = &'a Npc> + 'l
where
    'a: 'l,
{
    npcs.iter().filter(move |npc| {
        npc.is_female()
            && npc
                .race
                .as_deref()
                .is_some_and(|race| lists.is_humanoid_race(race))
    })
}

/// Admitted templates per race, in load order. Read-only once built.
#[derive(Debug, Default)]
pub struct TemplatePool<'a> {
    by_race: HashMap<String, Vec<&'a Npc>>,
}

impl<'a> TemplatePool<'a> {
    /// Admit every candidate that is either the trusted vanilla exception, or
    /// from a non-blacklisted plugin with both FaceGen files present.
    pub fn build(npcs: &'a [Npc], cache: &FacegenCache, lists: &PatchLists) -> Self {
        let mut pool = Self::default();

        for npc in template_candidates(npcs, lists) {
            let Some(race) = npc.race.as_deref() else {
                continue;
            };
            let admitted = races::is_exception(race, &npc.form_key)
                || (!lists.is_blacklisted(&npc.form_key.plugin)
                    && cache.get(&npc.form_key).is_complete());

            if admitted {
                pool.by_race.entry(race.to_string()).or_default().push(npc);
            }
        }

        info!("Collected templates for {} races.", pool.by_race.len());
        pool
    }

    /// Admit a template directly, bypassing the admission rules.
    pub fn insert(&mut self, race: &str, template: &'a Npc) {
        self.by_race.entry(race.to_string()).or_default().push(template);
    }

    /// Admitted templates for one race.
    pub fn for_race(&self, race: &str) -> &[&'a Npc] {
        self.by_race.get(race).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of the pools for `races`, in the given race order.
    pub fn union(&self, races: &[&str]) -> Vec<&'a Npc> {
        races
            .iter()
            .flat_map(|race| self.for_race(race).iter().copied())
            .collect()
    }

    pub fn race_count(&self) -> usize {
        self.by_race.len()
    }

    pub fn template_count(&self) -> usize {
        self.by_race.values().map(Vec::len).sum()
    }

    /// (race, template count) sorted by race
    pub fn summary(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = self
            .by_race
            .iter()
            .map(|(race, list)| (race.as_str(), list.len()))
            .collect();
        out.sort_unstable();
        out
    }
}

/// Templates that completed a full provisioning this run, keyed by the
/// target race they served. Only ever grows.
#[derive(Debug, Default)]
pub struct ProvenPool<'a> {
    by_race: HashMap<String, Vec<&'a Npc>>,
}

impl<'a> ProvenPool<'a> {
    pub fn register(&mut self, race: &str, template: &'a Npc) {
        self.by_race.entry(race.to_string()).or_default().push(template);
    }

    pub fn for_race(&self, race: &str) -> &[&'a Npc] {
        self.by_race.get(race).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_race.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_race.values().all(Vec::is_empty)
    }
}
