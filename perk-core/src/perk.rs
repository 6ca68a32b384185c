use serde::{Deserialize, Serialize};

// ============================================================================
// Scaling curves - level -> bonus magnitude
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingCurve {
    /// 1 + pct% per level.
    Additive { pct: f64 },
    /// (1 + pct%)^level. Negative pct gives a shrinking bonus.
    Compounding { pct: f64 },
    /// 1 + per_level * L * (1 + ramp * L); grows quadratically.
    Ramping { per_level: f64, ramp: f64 },
}

impl ScalingCurve {
    pub fn at(&self, level: f64) -> f64 {
        match self {
            Self::Additive { pct } => 1.0 + pct * 0.01 * level,
            Self::Compounding { pct } => (1.0 + pct * 0.01).powf(level),
            Self::Ramping { per_level, ramp } => 1.0 + per_level * level * (1.0 + ramp * level),
        }
    }
}

// ============================================================================
// Perk definition - one immutable catalog entry
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PerkDef {
    pub name: String,
    pub base_cost: f64,
    /// Selects the cost family: > 0 means arithmetic growth, 0 means
    /// exponential growth driven by `cost_exponent`.
    pub cost_increment: f64,
    pub cost_exponent: f64,
    pub scaling: ScalingCurve,
    pub max_level: f64,
}

impl PerkDef {
    /// Exponential-family perk: unit cost ceil(n/2 + base * exponent^n).
    pub fn exponential(name: &str, base_cost: f64, scaling: ScalingCurve) -> Self {
        PerkDef {
            name: name.to_string(),
            base_cost,
            cost_increment: 0.0,
            cost_exponent: 1.3,
            scaling,
            max_level: f64::INFINITY,
        }
    }

    /// Arithmetic-family perk: unit cost base + increment * n.
    pub fn arithmetic(name: &str, base_cost: f64, increment: f64, scaling: ScalingCurve) -> Self {
        PerkDef {
            name: name.to_string(),
            base_cost,
            cost_increment: increment,
            cost_exponent: 1.3,
            scaling,
            max_level: f64::INFINITY,
        }
    }

    pub fn with_max_level(mut self, max_level: f64) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.cost_exponent = exponent;
        self
    }
}

// ============================================================================
// Perk - mutable per-run state over a definition
// ============================================================================

/// Run state of a single perk. Levels are integer-valued but stored as f64:
/// constraint bounds arrive as reals and every cost formula works in f64.
#[derive(Debug, Clone, PartialEq)]
pub struct Perk {
    def: PerkDef,
    pub locked: bool,
    pub level: f64,
    pub min_level: f64,
    pub max_level: f64,
    /// Price of the next level, never cumulative spend.
    pub cost: f64,
    /// scaling(level), kept current across level changes.
    pub bonus: f64,
    /// Marginal utility of one more level; recomputed each outer pass.
    pub gain: f64,
}

impl Perk {
    pub fn new(def: PerkDef) -> Self {
        let cost = if def.cost_increment > 0.0 {
            def.base_cost
        } else {
            unit_cost(&def, 0.0)
        };
        let bonus = def.scaling.at(0.0);
        let max_level = def.max_level;
        Perk {
            def,
            locked: true,
            level: 0.0,
            min_level: 0.0,
            max_level,
            cost,
            bonus,
            gain: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn cost_increment(&self) -> f64 {
        self.def.cost_increment
    }

    pub fn bonus_at(&self, level: f64) -> f64 {
        self.def.scaling.at(level)
    }

    /// Whether the allocator may currently buy this perk another level.
    /// The floor-scaled affordability term clamps purchase sizing at extreme
    /// level magnitudes.
    pub fn levellable(&self, budget_left: f64) -> bool {
        !self.locked
            && self.level < self.max_level
            && self.cost * 1.0_f64.max((self.level / 1e12).floor()) <= budget_left
    }

    /// Level by `amount` (may be negative) and return the amount spent.
    ///
    /// Arithmetic family uses the closed-form batch cost; exponential family
    /// prices one level at a time, so batch purchases are iterated by the
    /// caller. A +k followed by -k restores level, cost, and bonus exactly.
    pub fn level_up(&mut self, amount: f64) -> f64 {
        self.level += amount;
        self.bonus = self.def.scaling.at(self.level);
        if self.def.cost_increment > 0.0 {
            let spent = amount * (self.cost + self.def.cost_increment * (amount - 1.0) / 2.0);
            self.cost += amount * self.def.cost_increment;
            spent
        } else {
            let spent = self.cost;
            self.cost = unit_cost(&self.def, self.level);
            spent
        }
    }

    /// Total spend to reach the current level from zero.
    pub fn spent(&self) -> f64 {
        if self.def.cost_increment > 0.0 {
            return self.level * (self.def.base_cost + self.cost - self.def.cost_increment) / 2.0;
        }
        let mut total = 0.0;
        let mut x = 0.0;
        while x < self.level {
            total += unit_cost(&self.def, x);
            x += 1.0;
        }
        total
    }

    /// Converts a one-level marginal utility delta into a rate comparable
    /// across batch sizes: a linearized fractional-bonus estimate for the
    /// arithmetic family, a log-derivative for the exponential family.
    pub fn log_ratio(&self) -> f64 {
        if self.def.cost_increment > 0.0 {
            (self.def.scaling.at(1.0) - self.def.scaling.at(0.0)) / self.bonus
        } else {
            (self.def.scaling.at(self.level + 1.0) / self.bonus).ln()
        }
    }
}

fn unit_cost(def: &PerkDef, level: f64) -> f64 {
    (level / 2.0 + def.base_cost * def.cost_exponent.powf(level)).ceil()
}
