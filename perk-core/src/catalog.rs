use crate::perk::{PerkDef, ScalingCurve};

/// The default perk catalog. Every entry is exponential-family; the
/// arithmetic family is supported generically by the cost model but has no
/// catalog entry yet.
pub fn default_catalog() -> Vec<PerkDef> {
    use ScalingCurve::{Additive, Compounding, Ramping};

    vec![
        PerkDef::exponential("Greed", 1e10, Compounding { pct: 10.0 }).with_max_level(40.0),
        PerkDef::exponential("Tenacity", 5e7, Compounding { pct: 10.0 }).with_max_level(40.0),
        PerkDef::exponential("Criticality", 100.0, Additive { pct: 4.0 }),
        PerkDef::exponential("Equality", 1.0, Additive { pct: 10.0 }),
        PerkDef::exponential("Prismal", 1.0, Additive { pct: 1.0 }).with_max_level(100.0),
        PerkDef::exponential("Overkill", 1e6, Additive { pct: 500.0 }).with_max_level(30.0),
        PerkDef::exponential("Resilience", 100.0, Compounding { pct: 10.0 }),
        PerkDef::exponential(
            "Relentlessness",
            75.0,
            Ramping {
                per_level: 0.05,
                ramp: 0.3,
            },
        )
        .with_max_level(10.0),
        PerkDef::exponential("Carpentry", 25.0, Compounding { pct: 10.0 }),
        PerkDef::exponential("Artisanistry", 15.0, Compounding { pct: -5.0 }),
        PerkDef::exponential("Range", 1.0, Additive { pct: 1.0 }).with_max_level(10.0),
        PerkDef::exponential("Agility", 4.0, Compounding { pct: -5.0 }).with_max_level(20.0),
        PerkDef::exponential("Bait", 4.0, Additive { pct: 100.0 }),
        PerkDef::exponential("Trumps", 3.0, Additive { pct: 20.0 }),
        PerkDef::exponential("Pheromones", 3.0, Additive { pct: 10.0 }),
        PerkDef::exponential("Packrat", 3.0, Additive { pct: 20.0 }),
        PerkDef::exponential("Motivation", 2.0, Additive { pct: 5.0 }),
        PerkDef::exponential("Power", 1.0, Additive { pct: 5.0 }),
        PerkDef::exponential("Toughness", 1.0, Additive { pct: 5.0 }),
        PerkDef::exponential("Looting", 1.0, Additive { pct: 5.0 }),
    ]
}
