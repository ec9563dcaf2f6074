//! Record edits applied to a patched NPC override.

use crate::config::{PartSet, VisualPart, DEFAULT_HEIGHT, DEFAULT_WEIGHT};
use crate::records::{FormKey, Npc};

/// Restore game-state data from an earlier override so patching only
/// changes the face: level, stat offsets, flags, keywords, inventory,
/// AI packages, perks and factions.
pub fn carry_forward(patched: &mut Npc, prior: &Npc) {
    let config = &mut patched.configuration;
    config.level = prior.configuration.level.clone();
    config.calc_min_level = prior.configuration.calc_min_level;
    config.calc_max_level = prior.configuration.calc_max_level;
    config.health_offset = prior.configuration.health_offset;
    config.magicka_offset = prior.configuration.magicka_offset;
    config.stamina_offset = prior.configuration.stamina_offset;
    config.disposition_base = prior.configuration.disposition_base;
    config.flags = prior.configuration.flags;

    patched.keywords = Some(prior.keywords.clone().unwrap_or_default());

    // Inventory and perks are replaced only where the override has the subrecord
    if let Some(items) = patched.items.as_mut() {
        *items = prior.items.clone().unwrap_or_default();
    }
    if let Some(perks) = patched.perks.as_mut() {
        *perks = prior.perks.clone().unwrap_or_default();
    }

    patched.packages = prior.packages.clone();
    patched.factions = prior.factions.clone();
}

/// Copy the enabled face data groups from `template`.
pub fn copy_face(patched: &mut Npc, template: &Npc, parts: &PartSet) {
    for part in parts.ordered() {
        match part {
            VisualPart::HeadParts => patched.head_parts = template.head_parts.clone(),
            VisualPart::WornArmor => patched.worn_armor = template.worn_armor.clone(),
            VisualPart::TextureLighting => patched.texture_lighting = template.texture_lighting,
            VisualPart::FaceMorph => {
                if let Some(morph) = &template.face_morph {
                    patched.face_morph = Some(morph.clone());
                }
            }
            VisualPart::FaceParts => patched.face_parts = template.face_parts,
            VisualPart::TintLayers => patched.tint_layers = template.tint_layers.clone(),
            VisualPart::HeadTexture => patched.head_texture = template.head_texture.clone(),
            VisualPart::HairColor => patched.hair_color = template.hair_color.clone(),
        }
    }
}

/// Take the template's height and weight, falling back to defaults for zero.
pub fn copy_body(patched: &mut Npc, template: &Npc) {
    patched.height = if template.height != 0.0 {
        template.height
    } else {
        DEFAULT_HEIGHT
    };
    patched.weight = if template.weight != 0.0 {
        template.weight
    } else {
        DEFAULT_WEIGHT
    };
}

/// Add the idempotency keyword.
pub fn mark_patched(patched: &mut Npc, marker: &FormKey) {
    let keywords = patched.keywords.get_or_insert_with(Vec::new);
    if !keywords.contains(marker) {
        keywords.push(marker.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Color, ContainerEntry, FaceParts, Level, NpcFlags, PerkPlacement, RankPlacement, TintLayer};

    fn key(id: u32) -> FormKey {
        FormKey::new(id, "Skyrim.esm")
    }

    #[test]
    fn test_carry_forward() {
        let mut patched = Npc::new(key(1));
        patched.items = Some(vec![ContainerEntry { item: key(0x50), count: 1 }]);
        patched.perks = None;
        patched.configuration.health_offset = 99;

        let mut prior = Npc::new(key(1));
        prior.configuration.level = Level::PcMultiplier(1.5);
        prior.configuration.health_offset = 10;
        prior.configuration.flags = NpcFlags(0x20);
        prior.keywords = None;
        prior.items = None;
        prior.perks = Some(vec![PerkPlacement { perk: key(0x60), rank: 1 }]);
        prior.packages = vec![key(0x70)];
        prior.factions = vec![RankPlacement { faction: key(0x80), rank: 2 }];

        carry_forward(&mut patched, &prior);

        assert_eq!(patched.configuration.level, Level::PcMultiplier(1.5));
        assert_eq!(patched.configuration.health_offset, 10);
        assert_eq!(patched.configuration.flags, NpcFlags(0x20));
        assert_eq!(patched.keywords, Some(vec![]));
        // Override had items, prior had none: cleared
        assert_eq!(patched.items, Some(vec![]));
        // Override had no perk list: left absent
        assert_eq!(patched.perks, None);
        assert_eq!(patched.packages, vec![key(0x70)]);
        assert_eq!(patched.factions.len(), 1);
    }

    #[test]
    fn test_copy_face_respects_parts() {
        let mut template = Npc::new(key(2));
        template.head_parts = vec![key(0x100)];
        template.hair_color = Some(key(0x200));
        template.texture_lighting = Some(Color { r: 1, g: 2, b: 3, a: 0 });
        template.face_parts = Some(FaceParts { nose: 1, unknown: 0, eyes: 2, mouth: 3 });
        template.tint_layers = vec![TintLayer { index: 4, color: None, interpolation: 0.5, preset: None }];

        let mut patched = Npc::new(key(1));
        let parts: PartSet = [VisualPart::HeadParts, VisualPart::TintLayers].into_iter().collect();
        copy_face(&mut patched, &template, &parts);

        assert_eq!(patched.head_parts, vec![key(0x100)]);
        assert_eq!(patched.tint_layers.len(), 1);
        assert_eq!(patched.hair_color, None);
        assert_eq!(patched.texture_lighting, None);
        assert_eq!(patched.face_parts, None);
    }

    #[test]
    fn test_missing_morph_keeps_existing() {
        let template = Npc::new(key(2));
        let mut patched = Npc::new(key(1));
        patched.face_morph = Some([("NoseLong".to_string(), 0.3)].into_iter().collect());

        copy_face(&mut patched, &template, &PartSet::all());
        assert!(patched.face_morph.is_some());
    }

    #[test]
    fn test_copy_body_defaults() {
        let mut patched = Npc::new(key(1));
        let mut template = Npc::new(key(2));
        copy_body(&mut patched, &template);
        assert_eq!((patched.height, patched.weight), (1.0, 50.0));

        template.height = 0.95;
        template.weight = 20.0;
        copy_body(&mut patched, &template);
        assert_eq!((patched.height, patched.weight), (0.95, 20.0));
    }

    #[test]
    fn test_mark_patched_once() {
        let marker = FormKey::new(0x800, "Keywords.esp");
        let mut patched = Npc::new(key(1));
        mark_patched(&mut patched, &marker);
        mark_patched(&mut patched, &marker);
        assert_eq!(patched.keywords, Some(vec![marker.clone()]));
        assert!(patched.has_keyword(&marker));
    }
}
