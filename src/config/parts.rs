//! Face data groups that can be copied from a template.

use super::ConfigError;
use std::collections::HashSet;
use std::str::FromStr;

/// A copyable group of face data, named by its subrecord signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualPart {
    /// PNAM - head parts
    HeadParts,
    /// WNAM - worn armor (skin)
    WornArmor,
    /// QNAM - texture lighting
    TextureLighting,
    /// NAM9 - face morph
    FaceMorph,
    /// NAMA - face parts
    FaceParts,
    /// TINI/TINC/TINV/TIAS - tint layers
    TintLayers,
    /// FTST - head texture
    HeadTexture,
    /// HCLF - hair color
    HairColor,
}

impl VisualPart {
    pub const ALL: [VisualPart; 8] = [
        VisualPart::HeadParts,
        VisualPart::WornArmor,
        VisualPart::TextureLighting,
        VisualPart::FaceMorph,
        VisualPart::FaceParts,
        VisualPart::TintLayers,
        VisualPart::HeadTexture,
        VisualPart::HairColor,
    ];

    /// Name used in the parts list.
    pub fn signature(&self) -> &'static str {
        match self {
            VisualPart::HeadParts => "PNAM",
            VisualPart::WornArmor => "WNAM",
            VisualPart::TextureLighting => "QNAM",
            VisualPart::FaceMorph => "NAM9",
            VisualPart::FaceParts => "NAMA",
            VisualPart::TintLayers => "Tint Layers",
            VisualPart::HeadTexture => "FTST",
            VisualPart::HairColor => "HCLF",
        }
    }
}

impl FromStr for VisualPart {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        VisualPart::ALL
            .into_iter()
            .find(|p| p.signature() == s)
            .ok_or_else(|| ConfigError::UnknownPart(s.to_string()))
    }
}

impl std::fmt::Display for VisualPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.signature())
    }
}

/// The set of parts enabled for this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSet(HashSet<VisualPart>);

impl PartSet {
    pub fn all() -> Self {
        Self(VisualPart::ALL.into_iter().collect())
    }

    pub fn contains(&self, part: VisualPart) -> bool {
        self.0.contains(&part)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parts in canonical order, for display.
    pub fn ordered(&self) -> Vec<VisualPart> {
        VisualPart::ALL
            .into_iter()
            .filter(|p| self.0.contains(p))
            .collect()
    }
}

impl FromIterator<VisualPart> for PartSet {
    fn from_iter<I: IntoIterator<Item = VisualPart>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signatures() {
        for part in VisualPart::ALL {
            assert_eq!(part.signature().parse::<VisualPart>().unwrap(), part);
        }
        assert_eq!(" NAM9 ".parse::<VisualPart>().unwrap(), VisualPart::FaceMorph);
    }

    #[test]
    fn test_unknown_part_fails() {
        assert!(matches!(
            "pnam".parse::<VisualPart>(),
            Err(ConfigError::UnknownPart(_))
        ));
        assert!(matches!(
            "XNAM".parse::<VisualPart>(),
            Err(ConfigError::UnknownPart(_))
        ));
    }

    #[test]
    fn test_ordered() {
        let set: PartSet = [VisualPart::HairColor, VisualPart::HeadParts].into_iter().collect();
        assert_eq!(set.ordered(), vec![VisualPart::HeadParts, VisualPart::HairColor]);
        assert_eq!(PartSet::all().len(), 8);
    }
}
