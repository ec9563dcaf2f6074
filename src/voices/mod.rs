//! Voice type remapping for patched NPCs.
//!
//! A direct male -> female voice map is tried first; when the source voice has
//! no entry, a random voice from the target race's fallback list is used.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

const DIRECT: &[(&str, &str)] = &[
    ("MaleArgonian", "FemaleArgonian"),
    ("MaleBandit", "FemaleCommoner"),
    ("MaleBrute", "FemaleCommander"),
    ("MaleChild", "FemaleChild"),
    ("MaleCommander", "FemaleCommander"),
    ("MaleCommoner", "FemaleCommoner"),
    ("MaleCommonerAccented", "FemaleCommoner"),
    ("MaleCondescending", "FemaleCondescending"),
    ("MaleCoward", "FemaleCoward"),
    ("MaleDarkElf", "FemaleDarkElf"),
    ("MaleDrunk", "FemaleSultry"),
    ("MaleElfHaughty", "FemaleElfHaughty"),
    ("MaleEvenToned", "FemaleEvenToned"),
    ("MaleEvenTonedAccented", "FemaleEvenToned"),
    ("MaleGuard", "FemaleCommander"),
    ("MaleKhajiit", "FemaleKhajiit"),
    ("MaleNord", "FemaleNord"),
    ("MaleNordCommander", "FemaleNord"),
    ("MaleOldGrumpy", "FemaleOldGrumpy"),
    ("MaleOldKindly", "FemaleOldKindly"),
    ("MaleOrc", "FemaleOrc"),
    ("MaleSlyCynical", "FemaleSultry"),
    ("MaleSoldier", "FemaleCommander"),
    ("MaleUniqueGhost", "FemaleUniqueGhost"),
    ("MaleWarlock", "FemaleCondescending"),
    ("MaleYoungEager", "FemaleYoungEager"),
    ("DLC1MaleVampire", "DLC1FemaleVampire"),
    ("DLC2MaleDarkElfCommoner", "DLC2FemaleDarkElfCommoner"),
    ("DLC2MaleDarkElfCynical", "FemaleDarkElf"),
];

const NORD_VOICES: &[&str] = &["FemaleNord", "FemaleEvenToned", "FemaleCommander"];
const DARK_ELF_VOICES: &[&str] = &["FemaleDarkElf", "DLC2FemaleDarkElfCommoner", "FemaleCondescending"];
const ARGONIAN_VOICES: &[&str] = &["FemaleArgonian", "FemaleSultry"];
const KHAJIIT_VOICES: &[&str] = &["FemaleKhajiit", "FemaleSultry"];
const HIGH_ELF_VOICES: &[&str] = &["FemaleElfHaughty", "FemaleEvenToned"];
const YOUNG_VOICES: &[&str] = &["FemaleEvenToned", "FemaleYoungEager"];
const IMPERIAL_VOICES: &[&str] = &["FemaleEvenToned", "FemaleCommander"];
const REDGUARD_VOICES: &[&str] = &["FemaleEvenToned", "FemaleSultry"];
const ORC_VOICES: &[&str] = &["FemaleOrc", "FemaleCommander"];

const RACE_FALLBACKS: &[(&str, &[&str])] = &[
    ("NordRace", NORD_VOICES),
    ("NordRaceVampire", NORD_VOICES),
    ("DarkElfRace", DARK_ELF_VOICES),
    ("DarkElfRaceVampire", DARK_ELF_VOICES),
    ("ArgonianRace", ARGONIAN_VOICES),
    ("ArgonianRaceVampire", ARGONIAN_VOICES),
    ("KhajiitRace", KHAJIIT_VOICES),
    ("KhajiitRaceVampire", KHAJIIT_VOICES),
    ("HighElfRace", HIGH_ELF_VOICES),
    ("HighElfRaceVampire", HIGH_ELF_VOICES),
    ("WoodElfRace", YOUNG_VOICES),
    ("WoodElfRaceVampire", YOUNG_VOICES),
    ("BretonRace", YOUNG_VOICES),
    ("BretonRaceVampire", YOUNG_VOICES),
    ("ImperialRace", IMPERIAL_VOICES),
    ("ImperialRaceVampire", IMPERIAL_VOICES),
    ("RedguardRace", REDGUARD_VOICES),
    ("RedguardRaceVampire", REDGUARD_VOICES),
    ("OrcRace", ORC_VOICES),
    ("OrcRaceVampire", ORC_VOICES),
];

static DIRECT_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DIRECT.iter().copied().collect());

static FALLBACK_MAP: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| RACE_FALLBACKS.iter().copied().collect());

/// Outcome of a voice lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceChoice {
    /// Direct counterpart of the source voice
    Mapped(&'static str),
    /// Random pick from the race's fallback list
    Fallback(&'static str),
}

impl VoiceChoice {
    pub fn voice(&self) -> &'static str {
        match self {
            VoiceChoice::Mapped(v) | VoiceChoice::Fallback(v) => *v,
        }
    }
}

/// Pick the replacement for `voice` on an NPC of `race`.
///
/// Draws from `rng` only when the fallback list is consulted.
pub fn remap_voice<R: Rng + ?Sized>(voice: &str, race: &str, rng: &mut R) -> Option<VoiceChoice> {
    if let Some(mapped) = DIRECT_MAP.get(voice) {
        return Some(VoiceChoice::Mapped(*mapped));
    }

    FALLBACK_MAP
        .get(race)
        .and_then(|voices| voices.choose(rng))
        .map(|v| VoiceChoice::Fallback(*v))
}
