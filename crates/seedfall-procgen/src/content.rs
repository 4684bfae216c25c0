//! Entity, item, spell, and skill generators.
//!
//! All four share a shape: a pure `(seed, params) -> definition` function
//! producing an immutable record keyed by a stable [`ContentId`] derived
//! from the seed. Definitions are content -- world init installs them once;
//! live instances (an item in an inventory, a cast spell) reference the id,
//! never the record itself.

use rand::Rng;
use seedfall_seed::SubSeed;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};

/// A stable 64-bit id for a piece of generated content (item, spell, skill,
/// entity template, genre). Derived from the seed that produced it, so the
/// same generation call always yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(pub u64);

impl ContentId {
    fn from_seed(seed: SubSeed) -> Self {
        ContentId(seed.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    fn from_roll(roll: f64) -> Self {
        match roll {
            r if r < 0.50 => Rarity::Common,
            r if r < 0.78 => Rarity::Uncommon,
            r if r < 0.93 => Rarity::Rare,
            r if r < 0.99 => Rarity::Epic,
            _ => Rarity::Legendary,
        }
    }

    /// Multiplier applied to base stat ranges.
    fn stat_multiplier(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 1.25,
            Rarity::Rare => 1.6,
            Rarity::Epic => 2.1,
            Rarity::Legendary => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
}

const ELEMENTAL_KINDS: [DamageKind; 4] =
    [DamageKind::Fire, DamageKind::Ice, DamageKind::Lightning, DamageKind::Poison];

// ---------------------------------------------------------------------------
// Item generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemParams {
    /// Player/area level driving stat bounds. Must be >= 1.
    pub level: u32,
    /// Fraction in [0, 1] biasing toward elemental (vs. plain physical) items.
    pub elemental_bias: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ContentId,
    pub rarity: Rarity,
    pub damage_kind: DamageKind,
    pub power: f64,
    pub level_req: u32,
}

pub fn generate_item(seed: SubSeed, params: &ItemParams) -> GenResult<ItemDef> {
    if params.level == 0 {
        return Err(GenError::InvalidParams("item level must be >= 1".to_owned()));
    }
    if !(0.0..=1.0).contains(&params.elemental_bias) {
        return Err(GenError::InvalidParams("elemental_bias must be in [0, 1]".to_owned()));
    }

    let mut rng = seed.rng();
    let rarity = Rarity::from_roll(rng.gen());
    let damage_kind = if rng.gen_bool(params.elemental_bias) {
        ELEMENTAL_KINDS[rng.gen_range(0..ELEMENTAL_KINDS.len())]
    } else {
        DamageKind::Physical
    };
    let base_power = params.level as f64 * rng.gen_range(0.8..1.2);
    let power = base_power * rarity.stat_multiplier();

    Ok(ItemDef {
        id: ContentId::from_seed(seed),
        rarity,
        damage_kind,
        power,
        level_req: params.level,
    })
}

// ---------------------------------------------------------------------------
// Spell generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellParams {
    pub level: u32,
    pub preferred_kind: Option<DamageKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDef {
    pub id: ContentId,
    pub damage_kind: DamageKind,
    pub base_damage: f64,
    pub cooldown_secs: f64,
}

pub fn generate_spell(seed: SubSeed, params: &SpellParams) -> GenResult<SpellDef> {
    if params.level == 0 {
        return Err(GenError::InvalidParams("spell level must be >= 1".to_owned()));
    }
    let mut rng = seed.rng();
    let damage_kind = params
        .preferred_kind
        .unwrap_or_else(|| ELEMENTAL_KINDS[rng.gen_range(0..ELEMENTAL_KINDS.len())]);
    let base_damage = params.level as f64 * rng.gen_range(3.0..6.0);
    let cooldown_secs = rng.gen_range(1.5..8.0);

    Ok(SpellDef {
        id: ContentId::from_seed(seed),
        damage_kind,
        base_damage,
        cooldown_secs,
    })
}

// ---------------------------------------------------------------------------
// Skill generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillEffect {
    PassiveAttackBonus,
    PassiveDefenseBonus,
    PassiveCritBonus,
    OnHitElementalProc(DamageKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillParams {
    pub tier: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: ContentId,
    pub effect: SkillEffect,
    pub magnitude: f64,
}

pub fn generate_skill(seed: SubSeed, params: &SkillParams) -> GenResult<SkillDef> {
    if params.tier == 0 {
        return Err(GenError::InvalidParams("skill tier must be >= 1".to_owned()));
    }
    let mut rng = seed.rng();
    let effect = match rng.gen_range(0..4) {
        0 => SkillEffect::PassiveAttackBonus,
        1 => SkillEffect::PassiveDefenseBonus,
        2 => SkillEffect::PassiveCritBonus,
        _ => SkillEffect::OnHitElementalProc(ELEMENTAL_KINDS[rng.gen_range(0..ELEMENTAL_KINDS.len())]),
    };
    let magnitude = params.tier as f64 * rng.gen_range(0.05..0.12);

    Ok(SkillDef {
        id: ContentId::from_seed(seed),
        effect,
        magnitude,
    })
}

// ---------------------------------------------------------------------------
// Entity template generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTemplateParams {
    pub level: u32,
    pub behavior_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTemplate {
    pub id: ContentId,
    pub base_health: f64,
    pub base_attack: f64,
    pub base_defense: f64,
    pub behavior_tag: String,
}

pub fn generate_entity_template(seed: SubSeed, params: &EntityTemplateParams) -> GenResult<EntityTemplate> {
    if params.level == 0 {
        return Err(GenError::InvalidParams("entity level must be >= 1".to_owned()));
    }
    if params.behavior_tag.is_empty() {
        return Err(GenError::InvalidParams("behavior_tag must not be empty".to_owned()));
    }
    let mut rng = seed.rng();
    let level = params.level as f64;

    Ok(EntityTemplate {
        id: ContentId::from_seed(seed),
        base_health: level * rng.gen_range(8.0..14.0),
        base_attack: level * rng.gen_range(1.5..3.0),
        base_defense: level * rng.gen_range(0.5..1.5),
        behavior_tag: params.behavior_tag.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_generation_is_deterministic() {
        let params = ItemParams { level: 10, elemental_bias: 0.5 };
        let a = generate_item(SubSeed(1), &params).unwrap();
        let b = generate_item(SubSeed(1), &params).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.power, b.power);
    }

    #[test]
    fn item_rejects_zero_level() {
        let params = ItemParams { level: 0, elemental_bias: 0.5 };
        assert!(generate_item(SubSeed(1), &params).is_err());
    }

    #[test]
    fn item_rejects_bad_bias() {
        let params = ItemParams { level: 1, elemental_bias: 1.5 };
        assert!(generate_item(SubSeed(1), &params).is_err());
    }

    #[test]
    fn spell_damage_scales_with_level() {
        let low = generate_spell(SubSeed(2), &SpellParams { level: 1, preferred_kind: Some(DamageKind::Fire) }).unwrap();
        let high = generate_spell(SubSeed(2), &SpellParams { level: 50, preferred_kind: Some(DamageKind::Fire) }).unwrap();
        assert!(high.base_damage > low.base_damage);
    }

    #[test]
    fn entity_template_requires_behavior_tag() {
        let params = EntityTemplateParams { level: 5, behavior_tag: String::new() };
        assert!(generate_entity_template(SubSeed(3), &params).is_err());
    }

    #[test]
    fn content_ids_differ_across_seeds() {
        let params = ItemParams { level: 5, elemental_bias: 0.3 };
        let a = generate_item(SubSeed(10), &params).unwrap();
        let b = generate_item(SubSeed(11), &params).unwrap();
        assert_ne!(a.id, b.id);
    }
}
