use crate::catalog::default_catalog;
use crate::constraints::parse_constraints;
use crate::error::AllocError;
use crate::evaluator::{Objective, Probe, ZoneEvaluator};
use crate::ledger::Ledger;
use crate::perk::Perk;
use crate::types::{PerkId, RunInput, RunOutput};

// ============================================================================
// Annealing schedule
// ============================================================================

/// First pass reserves 99.9% of the budget; squaring walks the reserve down
/// to nothing over ~15 passes.
const ANNEAL_START: f64 = 0.999;
const ANNEAL_FLOOR: f64 = 1e-12;

/// One full run over the default catalog: parse constraints, build the zone
/// evaluator, and allocate the budget.
pub fn optimize_run(input: &RunInput) -> Result<RunOutput, AllocError> {
    let mut ledger = Ledger::new(default_catalog());
    let entries = parse_constraints(&input.fixed, &input.unlocks, &ledger)?;
    ledger.apply(&entries);

    // Past zone 90 squads stop dying unless a fixed squad size is in play,
    // which makes Bait worthless. Cap it unless the caller pinned a minimum.
    if input.zone > 90 && input.mods.squad_size <= 1.0 {
        if let Some(bait) = ledger.find("Bait") {
            if ledger.perk(bait).min_level == 0.0 {
                ledger.perk_mut(bait).max_level = 0.0;
            }
        }
    }

    let evaluator = ZoneEvaluator::new(
        input.zone,
        &input.weights,
        &input.mods,
        &input.companion,
        &ledger,
    )?;
    let leftover = allocate(&mut ledger, &evaluator, input.budget, input.respec_available)?;
    Ok(ledger.to_output(leftover))
}

/// Spend `total_budget` across the ledger's unlocked perks, greedily by
/// marginal utility per unit cost, and return the leftover.
///
/// The budget is released in annealed passes: each pass spends only down to
/// a shrinking reserve target, so early purchases are sized small and cheap
/// perks cannot starve expensive ones that pay off later.
pub fn allocate(
    ledger: &mut Ledger,
    objective: &dyn Objective,
    total_budget: f64,
    respec_available: bool,
) -> Result<f64, AllocError> {
    let mut budget_left = total_budget;

    // Forced minimum levels are bought unconditionally; only the aggregate
    // overdraft is an error.
    let ids: Vec<PerkId> = ledger.ids().collect();
    for id in &ids {
        let perk = ledger.perk_mut(*id);
        if perk.locked || perk.min_level <= 0.0 {
            continue;
        }
        let spent = if perk.cost_increment() > 0.0 {
            perk.level_up(perk.min_level)
        } else {
            let mut spent = 0.0;
            while perk.level < perk.min_level {
                spent += perk.level_up(1.0);
            }
            spent
        };
        budget_left -= spent;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "allocate",
            perk = perk.name(),
            level = perk.level,
            spent,
            budget_left,
            "forced minimum"
        );
    }

    if budget_left < 0.0 {
        return Err(if respec_available {
            AllocError::FixedUnaffordable
        } else {
            AllocError::RespecUnavailable
        });
    }

    // Candidate queue, built once: a perk unaffordable now never returns,
    // even if the annealing later frees budget for it.
    let mut queue: Vec<PerkId> = ids
        .iter()
        .copied()
        .filter(|&id| ledger.perk(id).levellable(budget_left))
        .collect();

    let mut x = ANNEAL_START;
    while x > ANNEAL_FLOOR {
        let target = total_budget * x;

        // Refresh marginal gains via a pure probe of one extra level.
        // Arithmetic-family perks keep the gain carried through spend();
        // only exponential perks are re-probed each pass.
        let baseline = objective.score(ledger, None)?;
        for id in &ids {
            let perk = ledger.perk(*id);
            if perk.cost_increment() > 0.0 || !perk.levellable(budget_left) {
                continue;
            }
            let probe = Probe {
                perk: *id,
                bonus: perk.bonus_at(perk.level + 1.0),
            };
            let probed = objective.score(ledger, Some(probe))?;
            ledger.perk_mut(*id).gain = probed - baseline;
        }

        queue.sort_by(|&a, &b| ratio(ledger, b).total_cmp(&ratio(ledger, a)));

        #[cfg(feature = "instrument")]
        tracing::info!(target: "allocate", x, reserve = target, budget_left, "pass");

        while budget_left > target {
            if queue.is_empty() {
                break;
            }
            let best = queue.remove(0);
            if !ledger.perk(best).levellable(budget_left) {
                continue;
            }

            let window = budget_left - target;
            budget_left -= spend(ledger.perk_mut(best), window);

            #[cfg(feature = "instrument")]
            tracing::info!(
                target: "allocate",
                perk = ledger.perk(best).name(),
                level = ledger.perk(best).level,
                budget_left,
                "spend"
            );

            // Only this perk's ratio moved; walk it back to its slot rather
            // than resorting. Insertion lands ahead of equal ratios, keeping
            // the order it held before being popped.
            let best_ratio = ratio(ledger, best);
            let slot = queue
                .iter()
                .position(|&id| !(ratio(ledger, id) > best_ratio))
                .unwrap_or(queue.len());
            queue.insert(slot, best);
        }

        x *= x;
    }

    Ok(budget_left)
}

fn ratio(ledger: &Ledger, id: PerkId) -> f64 {
    let perk = ledger.perk(id);
    perk.gain / perk.cost
}

/// Buy into `perk` against the pass's spending window and return the amount
/// spent. The gain is divided out by the perk's utility rate before the
/// purchase and multiplied back after, so it reflects the post-purchase
/// level without another objective call.
fn spend(perk: &mut Perk, window: f64) -> f64 {
    perk.gain /= perk.log_ratio();
    let mut spent = 0.0;

    if perk.cost_increment() > 0.0 {
        // Closed-form batch: solve inc/2 * k^2 + (cost - inc/2) * k = damped
        // for k, the largest batch fitting the damped window.
        let ratio = 1.0 + perk.level;
        let damped = window * 0.5 * ratio * ratio;
        let batch = positive_quadratic_root(
            perk.cost_increment() / 2.0,
            perk.cost - perk.cost_increment() / 2.0,
            -damped,
        );
        let amount = batch
            .min(perk.max_level - perk.level)
            .max(1.0)
            .max(perk.level / 1e12)
            .floor();
        spent += perk.level_up(amount);
    } else {
        // Single buys while the next price stays under a damped window. The
        // first buy is unconditional.
        let damped = window.sqrt();
        loop {
            spent += perk.level_up(1.0);
            if !(perk.cost < damped && perk.level < perk.max_level) {
                break;
            }
        }
    }

    perk.gain *= perk.log_ratio();
    spent
}

/// Larger real root of ax^2 + bx + c = 0.
fn positive_quadratic_root(a: f64, b: f64, c: f64) -> f64 {
    let delta = b * b - 4.0 * a * c;
    (-b + delta.sqrt()) / (2.0 * a)
}
