use crate::error::AllocError;
use crate::ledger::Ledger;
use crate::types::{Companion, Metric, Mods, PerkId, Weights};

// ============================================================================
// Objective - the opaque scoring callback the allocator ranks against
// ============================================================================

/// A hypothetical one-perk bonus override. Scoring with a probe measures a
/// marginal gain without mutating the ledger, so a failing score call can
/// never leave a perk half-levelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub perk: PerkId,
    pub bonus: f64,
}

pub trait Objective {
    /// Weighted log-utility of the ledger's current bonuses, with `probe`
    /// optionally substituting one perk's bonus.
    fn score(&self, ledger: &Ledger, probe: Option<Probe>) -> Result<f64, AllocError>;
}

/// Read-through view of perk bonuses with at most one override.
#[derive(Clone, Copy)]
struct BonusView<'a> {
    ledger: &'a Ledger,
    probe: Option<Probe>,
}

impl BonusView<'_> {
    fn bonus(&self, id: PerkId) -> f64 {
        match self.probe {
            Some(probe) if probe.perk == id => probe.bonus,
            _ => self.ledger.perk(id).bonus,
        }
    }
}

// ============================================================================
// Metric weights - caller weights plus the derived pair
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricWeights {
    pub resource: f64,
    pub attack: f64,
    pub health: f64,
    pub xp: f64,
    pub population: f64,
    pub income: f64,
    pub agility: f64,
    pub overkill: f64,
}

impl MetricWeights {
    pub fn derive(weights: &Weights) -> Self {
        // Overkill only matters in proportion to attack; with no attack
        // weight it gets none at all.
        let overkill = if weights.attack > 0.0 {
            0.25 * weights.attack * (2.0 - 0.9_f64.powf(weights.resource / weights.attack))
        } else {
            0.0
        };
        MetricWeights {
            resource: weights.resource,
            attack: weights.attack,
            health: weights.health,
            xp: weights.xp,
            population: weights.population,
            income: weights.income,
            agility: (weights.resource + weights.attack) / 2.0,
            overkill,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Agility => self.agility,
            Metric::Resource => self.resource,
            Metric::Xp => self.xp,
            Metric::Attack => self.attack,
            Metric::Health => self.health,
            Metric::Overkill => self.overkill,
            Metric::Population => self.population,
            Metric::Income => self.income,
        }
    }
}

// ============================================================================
// ZoneEvaluator - concrete metric formulas for the default catalog
// ============================================================================

/// Perk handles the metric formulas read from.
#[derive(Debug, Clone, Copy)]
struct PerkRefs {
    motivation: PerkId,
    looting: PerkId,
    carpentry: PerkId,
    trumps: PerkId,
    packrat: PerkId,
    artisanistry: PerkId,
    power: PerkId,
    range: PerkId,
    toughness: PerkId,
    resilience: PerkId,
    agility: PerkId,
    bait: PerkId,
    pheromones: PerkId,
    overkill: PerkId,
}

impl PerkRefs {
    fn bind(ledger: &Ledger) -> Result<Self, AllocError> {
        let find = |name: &str| {
            ledger
                .find(name)
                .ok_or_else(|| AllocError::UnknownPerk(name.to_string()))
        };
        Ok(PerkRefs {
            motivation: find("Motivation")?,
            looting: find("Looting")?,
            carpentry: find("Carpentry")?,
            trumps: find("Trumps")?,
            packrat: find("Packrat")?,
            artisanistry: find("Artisanistry")?,
            power: find("Power")?,
            range: find("Range")?,
            toughness: find("Toughness")?,
            resilience: find("Resilience")?,
            agility: find("Agility")?,
            bait: find("Bait")?,
            pheromones: find("Pheromones")?,
            overkill: find("Overkill")?,
        })
    }
}

/// Scores a ledger from zone-derived constants, environment modifiers, and
/// the current perk bonuses. Pure: every call recomputes metrics from the
/// view it is given.
#[derive(Debug, Clone)]
pub struct ZoneEvaluator {
    zone: f64,
    weights: MetricWeights,
    ids: PerkRefs,

    // Adjusted modifiers
    income_mult: f64,
    loot_mult: f64,
    population_mult: f64,
    breed_mult: f64,
    storage: f64,
    squad_size: f64,
    chest_drops: f64,
    production: f64,
    loot: f64,

    // Zone-derived constants
    base_housing: f64,
    base_income: f64,
    base_resource: f64,
    max_tiers: f64,
    cost_exponent: f64,
    attack_exponent: f64,
    health_exponent: f64,
    equip_cost_attack: f64,
    equip_cost_health: f64,
    squad_base: f64,
    companion_attack: f64,
}

const COMPANION_LEVEL_CAP: f64 = 10.0;

impl ZoneEvaluator {
    pub fn new(
        zone: u32,
        weights: &Weights,
        mods: &Mods,
        companion: &Companion,
        ledger: &Ledger,
    ) -> Result<Self, AllocError> {
        let ids = PerkRefs::bind(ledger)?;
        let z = zone as f64;

        // Each boost compounds per cell cleared across the whole zone range.
        let boost = |enabled: bool| {
            if enabled {
                1.003_f64.powf(z * 99.0 * 0.03)
            } else {
                1.0
            }
        };
        let income_mult = boost(mods.income_boost);

        let books = 1.25_f64.powf(z)
            * (if zone > 100 { 1.28_f64 } else { 1.2 }).powf((z - 59.0).max(0.0));
        let base_housing = 1.25_f64.powf(5.0 + (z / 2.0).min(30.0));
        let max_tiers = z / 5.0 + if (z - 1.0).rem_euclid(10.0) < 5.0 { 1.0 } else { 0.0 };

        // Compounded squad-size growth; only the uncompressed first ratio
        // ever feeds the strength formula.
        let mut squad_base = 1.0_f64;
        for _ in 1..zone.max(1) {
            squad_base = (squad_base * 1.25).ceil();
        }

        let potential =
            (0.003 * companion.xp / 5.0_f64.powf(companion.prestige) + 1.0).ln() / 4.0_f64.ln();
        let companion_level = potential.floor().min(COMPANION_LEVEL_CAP);
        let progress = if companion_level == COMPANION_LEVEL_CAP {
            0.0
        } else {
            (4.0_f64.powf(potential - companion_level) - 1.0) / 3.0
        };
        let companion_attack = 1.0
            + 5.0_f64.powf(companion.prestige)
                * 0.1
                * (companion_level / 2.0 + progress)
                * (companion_level + 1.0);

        Ok(ZoneEvaluator {
            zone: z,
            weights: MetricWeights::derive(weights),
            ids,
            income_mult,
            loot_mult: boost(mods.loot_boost),
            population_mult: boost(mods.population_boost),
            breed_mult: boost(mods.breed_boost),
            storage: mods.storage,
            squad_size: mods.squad_size,
            chest_drops: mods.chest_drops,
            production: mods.production,
            loot: mods.loot * 20.8, // TODO: check that this is correct
            base_housing,
            base_income: 600.0 * income_mult * books,
            base_resource: (z - 19.0).powi(2),
            max_tiers,
            cost_exponent: 1.069_f64.powf(0.85 * if zone < 60 { 57.0 } else { 53.0 }),
            attack_exponent: 1.19_f64.powi(13),
            health_exponent: 1.19_f64.powi(14),
            equip_cost_attack: 211.0 * (weights.attack + weights.health) / weights.attack,
            equip_cost_health: 248.0 * (weights.attack + weights.health) / weights.health,
            squad_base,
            companion_attack,
        })
    }

    pub fn weights(&self) -> &MetricWeights {
        &self.weights
    }

    /// Ticks needed to one-shot an enemy.
    fn ticks(&self, v: &BonusView) -> f64 {
        let agility = v.bonus(self.ids.agility);
        1.0 + if agility > 0.9 { 1.0 } else { 0.0 } + (10.0 * agility).ceil()
    }

    fn gem_income(&self, v: &BonusView) -> f64 {
        let drag = v.bonus(self.ids.motivation) * self.income_mult;
        let loot = v.bonus(self.ids.looting) * self.loot_mult * 0.75 * 0.8;
        let chests = self.chest_drops * drag * loot / 30.0;
        drag + loot + chests
    }

    /// Max population.
    fn population(&self, v: &BonusView) -> f64 {
        let carpentry = v.bonus(self.ids.carpentry);
        let housing = 3.0 + (self.base_housing * self.gem_income(v)).ln() / 1.4_f64.ln();
        let territory = v.bonus(self.ids.trumps) * self.zone;
        10.0 * (self.base_housing * housing + territory)
            * carpentry
            * self.population_mult
            * carpentry
    }

    fn income(&self, v: &BonusView) -> f64 {
        let storage = self.storage * v.bonus(self.ids.packrat);
        let loot = v.bonus(self.ids.looting) * self.loot_mult / self.ticks(v);
        let production = v.bonus(self.ids.motivation) * self.production;
        let chests = self.chest_drops * 0.1 * production * loot;
        self.base_income
            * (production + loot * self.loot + chests)
            * (1.0 - storage)
            * self.population(v)
    }

    /// Equipment stat multiplier affordable at the current income.
    fn equip(&self, v: &BonusView, cost_per_level: f64, exponent: f64) -> f64 {
        let cost = cost_per_level * v.bonus(self.ids.artisanistry);
        let mut levels = 1.136;
        let mut tiers = (1.0 + self.income(v) / cost).ln() / self.cost_exponent.ln();

        if tiers > self.max_tiers + 0.45 {
            levels = (1.0 + self.cost_exponent.powf(tiers - self.max_tiers) * 0.2).ln()
                / 1.2_f64.ln();
            tiers = self.max_tiers;
        }
        levels * exponent.powf(tiers)
    }

    /// Strength multiplier of the squad actually sent out.
    fn squad(&self, v: &BonusView) -> f64 {
        let mut pop = if self.squad_size > 0.0 {
            self.squad_size
        } else {
            self.population(v)
        } / 3.0;
        if self.squad_size > 1.0 {
            pop += 36000.0 * v.bonus(self.ids.bait);
        }
        let unbought = (pop.ln() / 1.25_f64.ln()).max(0.0);
        self.squad_base * 1.25_f64.powf(-unbought)
    }

    fn attack(&self, v: &BonusView) -> f64 {
        let attack = (0.15 + self.equip(v, self.equip_cost_attack, self.attack_exponent))
            * v.bonus(self.ids.power)
            * v.bonus(self.ids.range)
            * self.companion_attack;
        self.squad(v) * attack
    }

    fn breed(&self, v: &BonusView) -> f64 {
        let potency = 0.0085
            * if self.zone >= 60.0 { 0.1 } else { 1.0 }
            * 1.1_f64.powf((self.zone / 5.0).floor());
        potency * v.bonus(self.ids.pheromones) * self.breed_mult
    }

    /// Survivability across the number of attacks a squad must take.
    fn health(&self, v: &BonusView) -> f64 {
        let mut health = (0.6 + self.equip(v, self.equip_cost_health, self.health_exponent))
            * v.bonus(self.ids.toughness)
            * v.bonus(self.ids.resilience);

        // Target number of attacks to survive.
        let mut attacks = 6.0;
        if self.zone < 70.0 {
            // No geneticists yet: survive only as long as re-breeding takes.
            let breed = self.breed(v);
            let timer =
                (1.0 + self.squad(v) * breed / v.bonus(self.ids.bait)).ln() / (1.0 + breed).ln();
            attacks = timer / self.ticks(v);
        }
        health /= attacks;

        self.squad(v) * health
    }

    fn resource(&self, v: &BonusView) -> f64 {
        self.base_resource * v.bonus(self.ids.looting) + 45.0
    }

    fn metric(&self, metric: Metric, v: &BonusView) -> f64 {
        match metric {
            Metric::Agility => 1.0 / v.bonus(self.ids.agility),
            Metric::Resource => self.resource(v),
            Metric::Xp => 1.0,
            Metric::Attack => self.attack(v),
            Metric::Health => self.health(v),
            Metric::Overkill => v.bonus(self.ids.overkill),
            Metric::Population => self.population(v),
            Metric::Income => self.income(v),
        }
    }
}

impl Objective for ZoneEvaluator {
    fn score(&self, ledger: &Ledger, probe: Option<Probe>) -> Result<f64, AllocError> {
        let view = BonusView { ledger, probe };
        let mut total = 0.0;
        for metric in Metric::all() {
            let weight = self.weights.get(metric);
            if weight == 0.0 {
                continue;
            }
            let value = self.metric(metric, &view);
            if !value.is_finite() {
                return Err(AllocError::NonFiniteMetric { metric, value });
            }
            total += weight * value.ln();
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::types::Preset;

    fn fixture(zone: u32, weights: Weights, mods: Mods) -> (Ledger, ZoneEvaluator) {
        let ledger = Ledger::new(default_catalog());
        let evaluator =
            ZoneEvaluator::new(zone, &weights, &mods, &Companion::default(), &ledger).unwrap();
        (ledger, evaluator)
    }

    #[test]
    fn derived_weights() {
        let weights = MetricWeights::derive(&Weights {
            resource: 16.0,
            attack: 5.0,
            health: 1.0,
            xp: 4.0,
            population: 0.0,
            income: 0.0,
        });
        assert_eq!(weights.agility, 10.5);
        let expected = 0.25 * 5.0 * (2.0 - 0.9_f64.powf(16.0 / 5.0));
        assert!((weights.overkill - expected).abs() < 1e-12);
    }

    #[test]
    fn derived_overkill_weight_vanishes_without_attack() {
        let weights = MetricWeights::derive(&Weights {
            resource: 10.0,
            ..Weights::default()
        });
        assert_eq!(weights.overkill, 0.0);
    }

    #[test]
    fn score_is_finite_on_fresh_ledger() {
        let (ledger, evaluator) = fixture(40, Weights::preset(Preset::Mid), Mods::default());
        let score = evaluator.score(&ledger, None).unwrap();
        assert!(score.is_finite());
    }

    #[test]
    fn probe_raises_score_for_weighted_perk() {
        let (ledger, evaluator) = fixture(40, Weights::preset(Preset::Mid), Mods::default());
        let baseline = evaluator.score(&ledger, None).unwrap();

        let looting = ledger.find("Looting").unwrap();
        let probe = Probe {
            perk: looting,
            bonus: ledger.perk(looting).bonus_at(1.0),
        };
        let probed = evaluator.score(&ledger, Some(probe)).unwrap();
        assert!(
            probed > baseline,
            "one level of Looting must raise a resource-weighted score"
        );
    }

    #[test]
    fn probe_does_not_touch_the_ledger() {
        let (ledger, evaluator) = fixture(40, Weights::preset(Preset::Mid), Mods::default());
        let before = ledger.clone();
        let looting = ledger.find("Looting").unwrap();
        let probe = Probe {
            perk: looting,
            bonus: 2.0,
        };
        evaluator.score(&ledger, Some(probe)).unwrap();
        assert_eq!(ledger.perk(looting), before.perk(looting));
    }

    #[test]
    fn non_finite_weighted_metric_is_fatal_and_named() {
        let mods = Mods {
            chest_drops: f64::INFINITY,
            ..Mods::default()
        };
        let weights = Weights {
            population: 1.0,
            ..Weights::default()
        };
        let (ledger, evaluator) = fixture(40, weights, mods);

        let err = evaluator.score(&ledger, None).unwrap_err();
        match err {
            AllocError::NonFiniteMetric { metric, value } => {
                assert_eq!(metric, Metric::Population);
                assert!(!value.is_finite());
            }
            other => panic!("expected NonFiniteMetric, got {other:?}"),
        }
    }

    #[test]
    fn zero_weight_skips_non_finite_metrics() {
        let mods = Mods {
            chest_drops: f64::INFINITY,
            ..Mods::default()
        };
        // Population would be infinite, but only resource is weighted and
        // resource ignores chest drops.
        let weights = Weights {
            resource: 1.0,
            ..Weights::default()
        };
        let (ledger, evaluator) = fixture(40, weights, mods);
        assert!(evaluator.score(&ledger, None).is_ok());
    }

    #[test]
    fn income_boost_raises_an_income_weighted_score() {
        let weights = Weights {
            income: 1.0,
            ..Weights::default()
        };
        let mods = Mods {
            income_boost: true,
            ..Mods::default()
        };
        let (ledger, plain) = fixture(40, weights, Mods::default());
        let (_, boosted) = fixture(40, weights, mods);

        let base = plain.score(&ledger, None).unwrap();
        let better = boosted.score(&ledger, None).unwrap();
        assert!(better > base);
    }
}
