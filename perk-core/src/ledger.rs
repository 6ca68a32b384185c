use slotmap::SlotMap;

use crate::constraints::{Bound, ConstraintEntry};
use crate::perk::{Perk, PerkDef};
use crate::types::{PerkId, PerkOutcome, RunOutput};

// ============================================================================
// Ledger - per-run perk state, exclusive to one run
// ============================================================================

/// Owns every perk's run state. Iteration always follows catalog order so
/// runs are deterministic and ranking ties keep a stable order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    perks: SlotMap<PerkId, Perk>,
    order: Vec<PerkId>,
}

impl Ledger {
    pub fn new(defs: Vec<PerkDef>) -> Self {
        let mut ledger = Ledger {
            perks: SlotMap::with_key(),
            order: Vec::with_capacity(defs.len()),
        };
        for def in defs {
            ledger.add(def);
        }
        ledger
    }

    /// Add a perk to the ledger, returns its ID
    pub fn add(&mut self, def: PerkDef) -> PerkId {
        let id = self.perks.insert(Perk::new(def));
        self.order.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Perk IDs in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = PerkId> + '_ {
        self.order.iter().copied()
    }

    pub fn perk(&self, id: PerkId) -> &Perk {
        &self.perks[id]
    }

    pub fn perk_mut(&mut self, id: PerkId) -> &mut Perk {
        &mut self.perks[id]
    }

    /// Case-insensitive exact name lookup.
    pub fn find(&self, name: &str) -> Option<PerkId> {
        self.ids()
            .find(|&id| self.perks[id].name().eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> impl Iterator<Item = (PerkId, &str)> {
        self.order.iter().map(|&id| (id, self.perks[id].name()))
    }

    /// Apply pre-validated constraint entries. Every mentioned perk is
    /// unlocked; bounds overwrite in entry order, so later entries win.
    /// Inconsistent bounds (min above max) are deliberately not rejected
    /// here; the allocator fails closed through eligibility instead.
    pub fn apply(&mut self, entries: &[ConstraintEntry]) {
        for entry in entries {
            let perk = &mut self.perks[entry.perk];
            perk.locked = false;
            match entry.bound {
                Bound::AtLeast(level) => perk.min_level = level,
                Bound::AtMost(level) => perk.max_level = level,
                Bound::Exactly(level) => {
                    perk.min_level = level;
                    perk.max_level = level;
                }
            }
        }
    }

    pub fn to_output(&self, leftover: f64) -> RunOutput {
        RunOutput {
            leftover,
            perks: self
                .order
                .iter()
                .map(|&id| {
                    let perk = &self.perks[id];
                    PerkOutcome {
                        name: perk.name().to_string(),
                        level: perk.level as u64,
                        cost: perk.cost,
                        spent: perk.spent(),
                        locked: perk.locked,
                        capped: perk.level >= perk.max_level,
                    }
                })
                .collect(),
        }
    }
}
