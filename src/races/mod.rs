//! Race compatibility clusters.
//!
//! A template of any race in a cluster may serve a target of any other race in
//! the same cluster. Races with no cluster are only compatible with themselves.

use crate::records::FormKey;

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Race whose vanilla templates are trusted without an asset check.
pub const EXCEPTION_RACE: &str = "DA13AfflictedRace";

/// Plugin whose `EXCEPTION_RACE` templates are trusted.
pub const EXCEPTION_PLUGIN: &str = "Skyrim.esm";

const NORD: &[&str] = &["NordRace", "NordRaceVampire", "HothRace"];
const DARK_ELF: &[&str] = &[
    "DarkElfRace",
    "DarkElfRaceVampire",
    "_00DwemerRace",
    "MASNerevarineRace",
];
const ARGONIAN: &[&str] = &["ArgonianRace", "ArgonianRaceVampire"];
const KHAJIIT: &[&str] = &["KhajiitRace", "KhajiitRaceVampire"];
const HIGH_ELF: &[&str] = &[
    "HighElfRace",
    "HighElfRaceVampire",
    "SnowElfRace",
    "WB_ConjureCraftlord_Race",
];
const WOOD_ELF: &[&str] = &["WoodElfRace", "WoodElfRaceVampire"];
const BRETON: &[&str] = &["BretonRace", "BretonRaceVampire"];
const IMPERIAL: &[&str] = &["ImperialRace", "ImperialRaceVampire"];
const REDGUARD: &[&str] = &["RedguardRace", "RedguardRaceVampire"];
const ORC: &[&str] = &["OrcRace", "OrcRaceVampire"];
const ELDER: &[&str] = &["ElderRace", "ElderRaceVampire"];
const DREMORA: &[&str] = &["DremoraRace"];
const AFFLICTED: &[&str] = &[EXCEPTION_RACE];

/// Every cluster; each member maps to its whole cluster.
pub const CLUSTERS: &[&[&str]] = &[
    NORD, DARK_ELF, ARGONIAN, KHAJIIT, HIGH_ELF, WOOD_ELF, BRETON, IMPERIAL, REDGUARD, ORC, ELDER,
    DREMORA, AFFLICTED,
];

static COMPATIBILITY: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for cluster in CLUSTERS {
        for race in *cluster {
            map.insert(*race, *cluster);
        }
    }
    map
});

/// Races whose templates may serve `race`, in cluster order.
///
/// Always contains `race` itself.
pub fn compatible_races(race: &str) -> Vec<&str> {
    match COMPATIBILITY.get(race) {
        Some(cluster) => cluster.to_vec(),
        None => vec![race],
    }
}

/// Whether a template is the trusted vanilla exception.
pub fn is_exception(race: &str, key: &FormKey) -> bool {
    race == EXCEPTION_RACE && key.is_from(EXCEPTION_PLUGIN)
}
