use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::types::{Companion, Mods, Preset, RunInput, Weights};

// ============================================================================
// Save snapshot - read-only view of a live game, supplied by the embedder
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum StaffModKind {
    MinerSpeed,
    MetalDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
pub struct StaffMod {
    pub kind: StaffModKind,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(default)]
pub struct OwnedPerk {
    pub name: String,
    pub level: f64,
    /// Cumulative resource spent on this perk so far.
    pub spent: f64,
}

/// Everything the input form can be pre-filled from. The embedding page
/// extracts this from the save; nothing here is trusted beyond parsing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(default)]
pub struct SaveSnapshot {
    pub highest_zone: u32,
    /// Resource banked and not yet spent on anything.
    pub resource_owned: f64,
    /// Resource refunded by the pending respec, if one is open.
    pub resource_leftover: f64,
    pub can_respec: bool,
    pub perks: Vec<OwnedPerk>,
    /// Production mastery tier, 0 through 2.
    pub production_mastery: u8,
    /// Whether the improved map-loot mastery is owned.
    pub improved_map_loot: bool,
    pub jest_imp: bool,
    pub chrono_imp: bool,
    pub whip_imp: bool,
    pub magn_imp: bool,
    pub taunt_imp: bool,
    pub ven_imp: bool,
    pub staff_mods: Vec<StaffMod>,
    pub companion_xp: f64,
    pub companion_prestige: f64,
}

/// Seconds of production a map cache drop is worth at a given zone.
fn cache_value(zone: u32) -> f64 {
    match zone {
        0..60 => 0.0,
        60..85 => 7.0,
        85..160 => 10.0,
        160..185 => 14.0,
        _ => 20.0,
    }
}

/// Derive a full run input from a save snapshot and a weight preset.
///
/// With a respec the budget covers everything ever spent; without one the
/// current levels become floors instead and banked resource is excluded.
pub fn run_input_from_save(save: &SaveSnapshot, preset: Preset) -> RunInput {
    let spent: f64 = save.perks.iter().map(|p| p.spent).sum();
    let mut budget = save.resource_leftover + spent;
    if !save.can_respec {
        budget += save.resource_owned;
    }

    let unlocks = if save.can_respec {
        save.perks
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
            .join(",")
    } else {
        save.perks
            .iter()
            .map(|p| format!("{}>{}", p.name, p.level))
            .collect::<Vec<_>>()
            .join(",")
    };

    let mastery = match save.production_mastery {
        0 => 0.25,
        1 => 0.4,
        _ => 1.0,
    };
    let mut production = 1.0 + mastery;
    let mut loot = 1.0 + 0.333 * mastery;
    for staff_mod in &save.staff_mods {
        match staff_mod.kind {
            StaffModKind::MinerSpeed => production *= 1.0 + 0.01 * staff_mod.percent,
            StaffModKind::MetalDrop => loot *= 1.0 + 0.01 * staff_mod.percent,
        }
    }

    let imp = |owned: bool| if owned { 1.0 } else { 0.0 };
    let caches_per_map = if save.improved_map_loot { 5.0 } else { 4.0 };
    let chest_drops = 27.0 * imp(save.jest_imp)
        + 15.0 * imp(save.chrono_imp)
        + caches_per_map * cache_value(save.highest_zone);

    RunInput {
        budget,
        zone: save.highest_zone,
        respec_available: save.can_respec,
        fixed: String::new(),
        unlocks,
        weights: Weights::preset(preset),
        mods: Mods {
            income_boost: save.whip_imp,
            loot_boost: save.magn_imp,
            population_boost: save.taunt_imp,
            breed_boost: save.ven_imp,
            chest_drops,
            production,
            loot,
            ..Mods::default()
        },
        companion: Companion {
            xp: save.companion_xp,
            prestige: save.companion_prestige,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SaveSnapshot {
        SaveSnapshot {
            highest_zone: 120,
            resource_owned: 500.0,
            resource_leftover: 50.0,
            can_respec: false,
            perks: vec![
                OwnedPerk {
                    name: "Carpentry".to_string(),
                    level: 38.0,
                    spent: 3000.0,
                },
                OwnedPerk {
                    name: "Looting".to_string(),
                    level: 40.0,
                    spent: 2000.0,
                },
            ],
            production_mastery: 1,
            ..SaveSnapshot::default()
        }
    }

    #[test]
    fn budget_includes_banked_resource_without_respec() {
        let input = run_input_from_save(&snapshot(), Preset::Mid);
        assert_eq!(input.budget, 50.0 + 3000.0 + 2000.0 + 500.0);
    }

    #[test]
    fn budget_excludes_banked_resource_with_respec() {
        let mut save = snapshot();
        save.can_respec = true;
        let input = run_input_from_save(&save, Preset::Mid);
        assert_eq!(input.budget, 50.0 + 3000.0 + 2000.0);
        assert!(input.respec_available);
    }

    #[test]
    fn owned_levels_become_floors_without_respec() {
        let input = run_input_from_save(&snapshot(), Preset::Mid);
        assert_eq!(input.unlocks, "Carpentry>38,Looting>40");
    }

    #[test]
    fn respec_unlocks_without_floors() {
        let mut save = snapshot();
        save.can_respec = true;
        let input = run_input_from_save(&save, Preset::Mid);
        assert_eq!(input.unlocks, "Carpentry,Looting");
    }

    #[test]
    fn production_mastery_and_staff_feed_the_mods() {
        let mut save = snapshot();
        save.staff_mods = vec![
            StaffMod {
                kind: StaffModKind::MinerSpeed,
                percent: 50.0,
            },
            StaffMod {
                kind: StaffModKind::MetalDrop,
                percent: 20.0,
            },
        ];
        let input = run_input_from_save(&save, Preset::Mid);
        assert!((input.mods.production - 1.4 * 1.5).abs() < 1e-12);
        assert!((input.mods.loot - (1.0 + 0.333 * 0.4) * 1.2).abs() < 1e-12);
    }

    #[test]
    fn chest_drops_scale_with_zone_and_imps() {
        let mut save = snapshot();
        save.jest_imp = true;
        save.chrono_imp = true;

        // Zone 120 cache is worth 10s; base maps drop 4 caches.
        let input = run_input_from_save(&save, Preset::Mid);
        assert_eq!(input.mods.chest_drops, 27.0 + 15.0 + 4.0 * 10.0);

        save.improved_map_loot = true;
        save.highest_zone = 200;
        let input = run_input_from_save(&save, Preset::Mid);
        assert_eq!(input.mods.chest_drops, 27.0 + 15.0 + 5.0 * 20.0);
    }

    #[test]
    fn cache_value_tiers() {
        assert_eq!(cache_value(59), 0.0);
        assert_eq!(cache_value(60), 7.0);
        assert_eq!(cache_value(159), 10.0);
        assert_eq!(cache_value(184), 14.0);
        assert_eq!(cache_value(185), 20.0);
    }
}
