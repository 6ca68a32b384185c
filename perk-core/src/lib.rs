use serde::Serialize;
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

mod allocator;
mod catalog;
mod constraints;
mod error;
mod evaluator;
mod ledger;
mod perk;
mod snapshot;
mod types;

pub use allocator::{allocate, optimize_run};
pub use catalog::default_catalog;
pub use constraints::{Bound, ConstraintEntry, parse_amount, parse_constraints};
pub use error::AllocError;
pub use evaluator::{MetricWeights, Objective, Probe, ZoneEvaluator};
pub use ledger::Ledger;
pub use perk::{Perk, PerkDef, ScalingCurve};
pub use snapshot::{OwnedPerk, SaveSnapshot, StaffMod, StaffModKind, run_input_from_save};
pub use types::{
    Companion, Metric, Mods, PerkId, PerkOutcome, Preset, RunInput, RunOutput, Weights,
};

// ============================================================================
// WASM API
// ============================================================================

/// Run the allocator once over the default catalog.
#[wasm_bindgen]
pub fn optimize(input: RunInput) -> Result<RunOutput, JsError> {
    console_error_panic_hook::set_once();
    optimize_run(&input).map_err(|e| JsError::new(&e.to_string()))
}

/// Check a constraint expression without running anything; backs live form
/// validation in the UI.
#[wasm_bindgen]
pub fn validate_constraints(fixed: &str) -> Result<(), JsError> {
    let ledger = Ledger::new(default_catalog());
    parse_constraints(fixed, "", &ledger)
        .map(|_| ())
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Pre-fill run inputs from a save snapshot and a weight preset.
#[wasm_bindgen]
pub fn fill_from_save(save: SaveSnapshot, preset: Preset) -> RunInput {
    console_error_panic_hook::set_once();
    run_input_from_save(&save, preset)
}

#[derive(Debug, Clone, Serialize, Tsify)]
pub struct CatalogEntry {
    pub name: String,
    pub base_cost: f64,
    /// None when the perk has no level cap.
    pub max_level: Option<u64>,
}

/// Catalog summary for rendering the perk grid before any run.
#[wasm_bindgen]
pub fn catalog_entries() -> Result<JsValue, JsError> {
    let entries: Vec<CatalogEntry> = default_catalog()
        .into_iter()
        .map(|def| CatalogEntry {
            name: def.name,
            base_cost: def.base_cost,
            max_level: def.max_level.is_finite().then(|| def.max_level as u64),
        })
        .collect();
    serde_wasm_bindgen::to_value(&entries).map_err(|e| JsError::new(&e.to_string()))
}
