//! NPC record types
//!
//! Serde definitions for the subset of an NPC record the patcher reads and
//! writes. Field names follow the load order snapshot JSON.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable record identity: local id within the plugin that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormKey {
    pub id: u32,
    pub plugin: String,
}

impl FormKey {
    pub fn new(id: u32, plugin: impl Into<String>) -> Self {
        Self {
            id,
            plugin: plugin.into(),
        }
    }

    /// Six-digit upper-case hex id, e.g. `01A2B3`.
    pub fn id_string(&self) -> String {
        format!("{:06X}", self.id)
    }

    /// True if this key belongs to `plugin` (case-insensitive, like Windows).
    pub fn is_from(&self, plugin: &str) -> bool {
        self.plugin.eq_ignore_ascii_case(plugin)
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_string(), self.plugin)
    }
}

/// FormKey parse errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormKeyError {
    #[error("FormKey is missing ':' separator: {0}")]
    MissingSeparator(String),

    #[error("FormKey id is not a 6-digit hex value: {0}")]
    InvalidId(String),

    #[error("FormKey has an empty plugin name: {0}")]
    EmptyPlugin(String),
}

impl FromStr for FormKey {
    type Err = FormKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, plugin) = s
            .split_once(':')
            .ok_or_else(|| FormKeyError::MissingSeparator(s.to_string()))?;

        if id.len() != 6 {
            return Err(FormKeyError::InvalidId(s.to_string()));
        }
        let id = u32::from_str_radix(id, 16).map_err(|_| FormKeyError::InvalidId(s.to_string()))?;

        let plugin = plugin.trim();
        if plugin.is_empty() {
            return Err(FormKeyError::EmptyPlugin(s.to_string()));
        }

        Ok(Self::new(id, plugin))
    }
}

impl Serialize for FormKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FormKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// ACBS flag bits. Only the ones the patcher touches are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcFlags(pub u32);

impl NpcFlags {
    pub const FEMALE: u32 = 0x0000_0001;

    pub fn is_female(self) -> bool {
        self.0 & Self::FEMALE != 0
    }

    pub fn set_female(&mut self) {
        self.0 |= Self::FEMALE;
    }
}

/// NPC level: fixed, or scaled from the player's level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Level {
    Static(i16),
    PcMultiplier(f32),
}

impl Default for Level {
    fn default() -> Self {
        Level::Static(1)
    }
}

/// ACBS configuration block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfiguration {
    pub flags: NpcFlags,
    pub level: Level,
    pub calc_min_level: i16,
    pub calc_max_level: i16,
    pub health_offset: i16,
    pub magicka_offset: i16,
    pub stamina_offset: i16,
    pub disposition_base: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub item: FormKey,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkPlacement {
    pub perk: FormKey,
    pub rank: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankPlacement {
    pub faction: FormKey,
    pub rank: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default)]
    pub a: u8,
}

/// NAMA face part indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceParts {
    pub nose: u32,
    pub unknown: u32,
    pub eyes: u32,
    pub mouth: u32,
}

/// Tint layer (TINI/TINC/TINV/TIAS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TintLayer {
    pub index: u16,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub interpolation: f32,
    #[serde(default)]
    pub preset: Option<i16>,
}

/// NAM9 morph values keyed by slider name.
pub type FaceMorph = BTreeMap<String, f32>;

/// An NPC record as exported from the load order.
///
/// `Option` fields distinguish "record has no such subrecord" from an empty list,
/// which matters when carrying state forward from a prior override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub form_key: FormKey,
    #[serde(default)]
    pub editor_id: Option<String>,
    /// Race editor id; `None` when the race link does not resolve.
    #[serde(default)]
    pub race: Option<String>,
    /// Voice type editor id
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<FormKey>>,
    #[serde(default)]
    pub configuration: NpcConfiguration,
    #[serde(default)]
    pub items: Option<Vec<ContainerEntry>>,
    #[serde(default)]
    pub packages: Vec<FormKey>,
    #[serde(default)]
    pub perks: Option<Vec<PerkPlacement>>,
    #[serde(default)]
    pub factions: Vec<RankPlacement>,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub weight: f32,

    // Face data
    #[serde(default)]
    pub head_parts: Vec<FormKey>,
    #[serde(default)]
    pub worn_armor: Option<FormKey>,
    #[serde(default)]
    pub texture_lighting: Option<Color>,
    #[serde(default)]
    pub face_morph: Option<FaceMorph>,
    #[serde(default)]
    pub face_parts: Option<FaceParts>,
    #[serde(default)]
    pub tint_layers: Vec<TintLayer>,
    #[serde(default)]
    pub head_texture: Option<FormKey>,
    #[serde(default)]
    pub hair_color: Option<FormKey>,
}

impl Npc {
    /// Minimal record with everything else defaulted.
    pub fn new(form_key: FormKey) -> Self {
        Self {
            form_key,
            editor_id: None,
            race: None,
            voice: None,
            keywords: None,
            configuration: NpcConfiguration::default(),
            items: None,
            packages: Vec::new(),
            perks: None,
            factions: Vec::new(),
            height: 0.0,
            weight: 0.0,
            head_parts: Vec::new(),
            worn_armor: None,
            texture_lighting: None,
            face_morph: None,
            face_parts: None,
            tint_layers: Vec::new(),
            head_texture: None,
            hair_color: None,
        }
    }

    pub fn is_female(&self) -> bool {
        self.configuration.flags.is_female()
    }

    pub fn has_keyword(&self, keyword: &FormKey) -> bool {
        self.keywords
            .as_ref()
            .is_some_and(|kws| kws.iter().any(|k| k == keyword))
    }

    /// `EditorID (XXXXXX)` label used in logs and diagnostics.
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.editor_id.as_deref().unwrap_or("Unnamed"),
            self.form_key.id_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_key_roundtrip_text() {
        let key: FormKey = "01A2B3:Skyrim.esm".parse().unwrap();
        assert_eq!(key.id, 0x01A2B3);
        assert_eq!(key.plugin, "Skyrim.esm");
        assert_eq!(key.to_string(), "01A2B3:Skyrim.esm");
        assert_eq!(key.id_string(), "01A2B3");
    }

    #[test]
    fn test_form_key_parse_errors() {
        assert!(matches!(
            "01A2B3Skyrim.esm".parse::<FormKey>(),
            Err(FormKeyError::MissingSeparator(_))
        ));
        assert!(matches!(
            "1A2B3:Skyrim.esm".parse::<FormKey>(),
            Err(FormKeyError::InvalidId(_))
        ));
        assert!(matches!(
            "ZZZZZZ:Skyrim.esm".parse::<FormKey>(),
            Err(FormKeyError::InvalidId(_))
        ));
        assert!(matches!(
            "000800:".parse::<FormKey>(),
            Err(FormKeyError::EmptyPlugin(_))
        ));
    }

    #[test]
    fn test_form_key_plugin_case_insensitive() {
        let key = FormKey::new(0x800, "Skyrim.esm");
        assert!(key.is_from("SKYRIM.ESM"));
        assert!(!key.is_from("Dawnguard.esm"));
    }

    #[test]
    fn test_npc_deserialize_defaults() {
        let npc: Npc = serde_json::from_str(
            r#"{"form_key":"000014:Skyrim.esm","race":"NordRace","configuration":{"flags":1}}"#,
        )
        .unwrap();
        assert!(npc.is_female());
        assert_eq!(npc.race.as_deref(), Some("NordRace"));
        assert!(npc.keywords.is_none());
        assert!(npc.items.is_none());
        assert_eq!(npc.configuration.level, Level::Static(1));
        assert_eq!(npc.label(), "Unnamed (000014)");
    }

    #[test]
    fn test_flags() {
        let mut flags = NpcFlags(0x20);
        assert!(!flags.is_female());
        flags.set_female();
        assert!(flags.is_female());
        assert_eq!(flags.0, 0x21);
    }
}
