use thiserror::Error;

use crate::types::Metric;

/// Errors terminating a run. No partial allocation is ever returned; retry
/// means constructing a fresh run with corrected inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocError {
    /// Forced minimum levels cost more than the whole budget, but the caller
    /// could reallocate already-spent levels to cover them.
    #[error("not enough budget to afford your fixed perk levels")]
    FixedUnaffordable,

    /// Forced minimum levels cost more than the whole budget and no
    /// reallocation is available.
    #[error("no respec available to cover your fixed perk levels")]
    RespecUnavailable,

    /// The evaluator produced a non-finite value for a weighted metric.
    #[error("{metric} is {value}")]
    NonFiniteMetric { metric: Metric, value: f64 },

    #[error("unknown perk: {0}")]
    UnknownPerk(String),

    #[error("ambiguous perk abbreviation: {0}")]
    AmbiguousPerk(String),

    #[error("enter a list of perk levels, such as \"power=42, toughness=51\" (got \"{0}\")")]
    MalformedConstraint(String),

    #[error("invalid number: {0}")]
    InvalidLevel(String),
}
