use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct PerkId;
}

// ============================================================================
// Metrics - The derived performance numbers the objective scores
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Agility,
    Resource,
    Xp,
    Attack,
    Health,
    Overkill,
    Population,
    Income,
}

impl Metric {
    /// Returns an iterator over all metrics
    pub fn all() -> impl Iterator<Item = Metric> {
        [
            Metric::Agility,
            Metric::Resource,
            Metric::Xp,
            Metric::Attack,
            Metric::Health,
            Metric::Overkill,
            Metric::Population,
            Metric::Income,
        ]
        .into_iter()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Agility => "agility",
            Metric::Resource => "resource",
            Metric::Xp => "xp",
            Metric::Attack => "attack",
            Metric::Health => "health",
            Metric::Overkill => "overkill",
            Metric::Population => "population",
            Metric::Income => "income",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Weights - Caller-facing objective weights
// ============================================================================

/// Per-metric objective weights supplied by the caller.
///
/// Only the six caller-facing metrics are weighted directly; agility and
/// overkill weights are derived from these at run start.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct Weights {
    pub resource: f64,
    pub attack: f64,
    pub health: f64,
    pub xp: f64,
    pub population: f64,
    pub income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Early,
    Broken,
    Mid,
}

impl Weights {
    /// Stock weight profiles for common stages of progression.
    /// The xp weight is always derived from the other three.
    pub fn preset(preset: Preset) -> Self {
        let (resource, attack, health) = match preset {
            Preset::Early => (5.0, 4.0, 3.0),
            Preset::Broken => (7.0, 3.0, 1.0),
            Preset::Mid => (16.0, 5.0, 1.0),
        };
        Weights {
            resource,
            attack,
            health,
            xp: ((resource + attack + health) / 5.0).floor(),
            population: 0.0,
            income: 0.0,
        }
    }
}

// ============================================================================
// Environment modifiers - consumed opaquely by the evaluator
// ============================================================================

/// Environment modifiers affecting the evaluator's metric formulas.
///
/// The four boost flags are raised to a zone-scaled multiplier at run start;
/// the rest are used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct Mods {
    pub income_boost: bool,
    pub loot_boost: bool,
    pub population_boost: bool,
    pub breed_boost: bool,
    /// Fraction of income diverted to storage before it counts.
    pub storage: f64,
    /// Fixed squad size override; 0 means derive from population.
    pub squad_size: f64,
    /// Bonus income from timed chest drops, in seconds of production.
    pub chest_drops: f64,
    pub production: f64,
    pub loot: f64,
}

impl Default for Mods {
    fn default() -> Self {
        Mods {
            income_boost: false,
            loot_boost: false,
            population_boost: false,
            breed_boost: false,
            storage: 0.125,
            squad_size: 0.0,
            chest_drops: 0.0,
            production: 1.0,
            loot: 1.0,
        }
    }
}

/// Companion progress feeding the attack multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct Companion {
    pub xp: f64,
    pub prestige: f64,
}

// ============================================================================
// Run input / output - the JS boundary
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct RunInput {
    /// Total spendable budget for this run.
    pub budget: f64,
    pub zone: u32,
    /// Whether already-spent levels could be reallocated; only affects the
    /// error reported when fixed constraints exceed the budget.
    pub respec_available: bool,
    /// Free-text constraint expressions, e.g. "power=42, tough>10".
    pub fixed: String,
    /// Comma-separated unlocked perks, optionally with current levels
    /// ("carpentry>38,looting>40" or just "carpentry,looting").
    pub unlocks: String,
    pub weights: Weights,
    pub mods: Mods,
    pub companion: Companion,
}

impl Default for RunInput {
    fn default() -> Self {
        RunInput {
            budget: 0.0,
            zone: 20,
            respec_available: false,
            fixed: String::new(),
            unlocks: String::new(),
            weights: Weights::default(),
            mods: Mods::default(),
            companion: Companion::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PerkOutcome {
    pub name: String,
    pub level: u64,
    /// Price of the next level.
    pub cost: f64,
    /// Cumulative spend at the final level.
    pub spent: f64,
    pub locked: bool,
    pub capped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct RunOutput {
    pub leftover: f64,
    pub perks: Vec<PerkOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_xp_weight_is_derived() {
        let w = Weights::preset(Preset::Early);
        assert_eq!(w.xp, 2.0, "floor((5+4+3)/5)");
        let w = Weights::preset(Preset::Mid);
        assert_eq!(w.xp, 4.0, "floor((16+5+1)/5)");
    }

    #[test]
    fn mods_default_storage_fraction() {
        let mods = Mods::default();
        assert_eq!(mods.storage, 0.125);
        assert_eq!(mods.production, 1.0);
    }
}
