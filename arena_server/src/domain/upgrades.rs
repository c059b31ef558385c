// Upgrade catalog and effect applicator.
//
// The catalog is a closed set of upgrade kinds, each belonging to one rarity
// tier. Offers are drawn by first rolling a tier by weight, then picking a
// kind uniformly inside it. `apply_upgrade` is the only place that turns a
// kind into stat changes.

use crate::domain::rng::GameRng;
use crate::domain::state::Player;
use crate::domain::tuning::combat::CombatTuning;
use serde::{Deserialize, Serialize};

/// Offers presented per gate event.
pub const OFFERS_PER_CHOICE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Legendary,
    /// Boss-exclusive tier.
    Boss,
    /// Powerful effect with a drawback.
    Lunar,
    /// Corrupted variant of a regular upgrade.
    Void,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Legendary,
        Rarity::Boss,
        Rarity::Lunar,
        Rarity::Void,
    ];

    /// Relative draw weight.
    pub fn weight(self) -> u32 {
        match self {
            Rarity::Common => 50,
            Rarity::Uncommon => 30,
            Rarity::Legendary => 10,
            Rarity::Boss => 5,
            Rarity::Lunar => 3,
            Rarity::Void => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    // Common
    Damage,
    AttackSpeed,
    MoveSpeed,
    MaxHealth,
    Regeneration,
    CritChance,
    PickupRadius,
    Armor,
    // Uncommon
    MultiShot,
    Pierce,
    LifeSteal,
    Dodge,
    Thorns,
    Shield,
    Burn,
    Poison,
    Frost,
    Knockback,
    // Legendary
    Chain,
    Ricochet,
    Homing,
    Explosive,
    CritDamage,
    Bananarang,
    Orbital,
    Berserker,
    Executioner,
    Pet,
    FireTrail,
    // Boss
    OmniGlitch,
    ShadowClone,
    TitanHeart,
    // Lunar
    GlassCannon,
    Overclock,
    HeavyRounds,
    // Void
    VoidPierce,
    VoidChain,
    VoidHunger,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 38] = [
        UpgradeKind::Damage,
        UpgradeKind::AttackSpeed,
        UpgradeKind::MoveSpeed,
        UpgradeKind::MaxHealth,
        UpgradeKind::Regeneration,
        UpgradeKind::CritChance,
        UpgradeKind::PickupRadius,
        UpgradeKind::Armor,
        UpgradeKind::MultiShot,
        UpgradeKind::Pierce,
        UpgradeKind::LifeSteal,
        UpgradeKind::Dodge,
        UpgradeKind::Thorns,
        UpgradeKind::Shield,
        UpgradeKind::Burn,
        UpgradeKind::Poison,
        UpgradeKind::Frost,
        UpgradeKind::Knockback,
        UpgradeKind::Chain,
        UpgradeKind::Ricochet,
        UpgradeKind::Homing,
        UpgradeKind::Explosive,
        UpgradeKind::CritDamage,
        UpgradeKind::Bananarang,
        UpgradeKind::Orbital,
        UpgradeKind::Berserker,
        UpgradeKind::Executioner,
        UpgradeKind::Pet,
        UpgradeKind::FireTrail,
        UpgradeKind::OmniGlitch,
        UpgradeKind::ShadowClone,
        UpgradeKind::TitanHeart,
        UpgradeKind::GlassCannon,
        UpgradeKind::Overclock,
        UpgradeKind::HeavyRounds,
        UpgradeKind::VoidPierce,
        UpgradeKind::VoidChain,
        UpgradeKind::VoidHunger,
    ];

    pub fn rarity(self) -> Rarity {
        use UpgradeKind::*;
        match self {
            Damage | AttackSpeed | MoveSpeed | MaxHealth | Regeneration | CritChance
            | PickupRadius | Armor => Rarity::Common,
            MultiShot | Pierce | LifeSteal | Dodge | Thorns | Shield | Burn | Poison | Frost
            | Knockback => Rarity::Uncommon,
            Chain | Ricochet | Homing | Explosive | CritDamage | Bananarang | Orbital
            | Berserker | Executioner | Pet | FireTrail => Rarity::Legendary,
            OmniGlitch | ShadowClone | TitanHeart => Rarity::Boss,
            GlassCannon | Overclock | HeavyRounds => Rarity::Lunar,
            VoidPierce | VoidChain | VoidHunger => Rarity::Void,
        }
    }

    pub fn name(self) -> &'static str {
        use UpgradeKind::*;
        match self {
            Damage => "Sharpened Rounds",
            AttackSpeed => "Quick Trigger",
            MoveSpeed => "Light Feet",
            MaxHealth => "Vitality",
            Regeneration => "Regrowth",
            CritChance => "Keen Eye",
            PickupRadius => "Magnet",
            Armor => "Plating",
            MultiShot => "Multishot",
            Pierce => "Piercing Rounds",
            LifeSteal => "Vampirism",
            Dodge => "Evasion",
            Thorns => "Thorns",
            Shield => "Energy Shield",
            Burn => "Incendiary",
            Poison => "Toxic Tips",
            Frost => "Frost Rounds",
            Knockback => "Impact",
            Chain => "Chain Lightning",
            Ricochet => "Ricochet",
            Homing => "Homing",
            Explosive => "Explosive Kills",
            CritDamage => "Deadly Precision",
            Bananarang => "Bananarang",
            Orbital => "Orbital Blade",
            Berserker => "Berserker",
            Executioner => "Executioner",
            Pet => "Companion",
            FireTrail => "Fire Trail",
            OmniGlitch => "Omni Glitch",
            ShadowClone => "Shadow Clone",
            TitanHeart => "Titan Heart",
            GlassCannon => "Glass Cannon",
            Overclock => "Overclock",
            HeavyRounds => "Heavy Rounds",
            VoidPierce => "Void Lance",
            VoidChain => "Void Arc",
            VoidHunger => "Void Hunger",
        }
    }

    pub fn of_rarity(rarity: Rarity) -> impl Iterator<Item = UpgradeKind> {
        Self::ALL.into_iter().filter(move |kind| kind.rarity() == rarity)
    }
}

/// One offer in a gate event. `id` is unique within the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub id: u64,
    pub kind: UpgradeKind,
    pub rarity: Rarity,
    pub name: String,
}

pub fn roll_rarity(rng: &mut GameRng) -> Rarity {
    let weights = Rarity::ALL.map(Rarity::weight);
    rng.pick_weighted(&weights)
        .and_then(|index| Rarity::ALL.get(index).copied())
        .unwrap_or(Rarity::Common)
}

/// Draw a fresh set of offers. With `forced`, every offer comes from that tier.
/// Repeats across a player's lifetime are allowed; `next_id` allocates option ids.
pub fn draw_offers(
    rng: &mut GameRng,
    forced: Option<Rarity>,
    mut next_id: impl FnMut() -> u64,
) -> Vec<UpgradeOption> {
    (0..OFFERS_PER_CHOICE)
        .map(|_| {
            let rarity = forced.unwrap_or_else(|| roll_rarity(rng));
            let pool: Vec<UpgradeKind> = UpgradeKind::of_rarity(rarity).collect();
            let kind = rng.pick(&pool).copied().unwrap_or(UpgradeKind::Damage);
            UpgradeOption {
                id: next_id(),
                kind,
                rarity,
                name: kind.name().to_string(),
            }
        })
        .collect()
}

/// Mutate `player` for one taken upgrade and record it in the tally.
pub fn apply_upgrade(player: &mut Player, kind: UpgradeKind, combat: &CombatTuning) {
    use UpgradeKind::*;
    let stats = &mut player.stats;
    match kind {
        Damage => stats.projectile_damage += 5.0,
        AttackSpeed => stats.attack_speed += 0.15,
        MoveSpeed => stats.speed += 0.5,
        MaxHealth => {
            player.max_health += 20.0;
            player.heal(20.0);
        }
        Regeneration => stats.regeneration += 1.0,
        CritChance => stats.crit_chance = (stats.crit_chance + 0.05).min(1.0),
        PickupRadius => stats.pickup_radius += 25.0,
        Armor => stats.armor = (stats.armor + 0.05).min(combat.armor_cap),
        MultiShot => stats.projectiles_per_shot += 1,
        Pierce => stats.pierce += 1,
        LifeSteal => stats.life_steal += 0.03,
        Dodge => stats.dodge = (stats.dodge + 0.05).min(combat.dodge_cap),
        Thorns => stats.thorns += 0.2,
        Shield => {
            stats.max_shield += 25.0;
            stats.shield = (stats.shield + 25.0).min(stats.max_shield);
        }
        Burn => stats.burn_damage += 10.0,
        Poison => stats.poison_damage += 15.0,
        Frost => stats.slow_amount = (stats.slow_amount + 0.15).min(combat.slow_cap),
        Knockback => stats.knockback += 4.0,
        Chain => stats.chain += 1,
        Ricochet => stats.ricochet += 1,
        Homing => stats.homing = true,
        Explosive => {
            stats.explosion_radius = if stats.explosion_radius <= 0.0 {
                60.0
            } else {
                stats.explosion_radius + 15.0
            };
            stats.explosion_damage += 10.0;
        }
        CritDamage => stats.crit_multiplier += 0.5,
        Bananarang => {
            stats.has_bananarang = true;
            stats.bananarangs_per_shot += 1;
        }
        Orbital => stats.orbital_count += 1,
        Berserker => stats.has_berserker = true,
        Executioner => stats.has_executioner = true,
        Pet => {
            if stats.has_pet {
                stats.pet_damage_bonus += 3.0;
            } else {
                stats.has_pet = true;
            }
        }
        FireTrail => stats.has_fire_trail = true,
        OmniGlitch => stats.has_omni_glitch = true,
        ShadowClone => stats.clone_count += 1,
        TitanHeart => {
            player.max_health += 100.0;
            player.heal(player.max_health);
        }
        GlassCannon => {
            stats.projectile_damage *= 2.0;
            player.max_health *= 0.5;
        }
        Overclock => {
            stats.attack_speed *= 1.6;
            stats.max_shield = 0.0;
            stats.shield = 0.0;
        }
        HeavyRounds => {
            stats.projectile_damage *= 1.5;
            stats.projectile_speed *= 0.7;
        }
        VoidPierce => {
            stats.pierce += 3;
            stats.projectile_damage *= 0.8;
        }
        VoidChain => {
            stats.chain += 2;
            stats.crit_chance = (stats.crit_chance - 0.05).max(0.0);
        }
        VoidHunger => {
            stats.life_steal += 0.15;
            player.max_health -= 25.0;
        }
    }

    player.clamp_health();
    player.record_upgrade(kind);
}
