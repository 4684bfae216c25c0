//! Error taxonomy for procedural generators.
//!
//! Generators never panic. A malformed `params` value or an unsatisfiable
//! constraint set is always surfaced as a [`GenError`] for the caller to
//! handle -- retry with relaxed constraints, log, or propagate.

/// Errors a generator may return. Never fatal to the simulation; the caller
/// decides whether to retry, relax parameters, or give up.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// A parameter was out of its documented range or otherwise malformed.
    #[error("invalid generator params: {0}")]
    InvalidParams(String),

    /// The constraint set could not be satisfied within the generator's
    /// retry budget (e.g. terrain reachability could not be guaranteed).
    #[error("generation infeasible after {attempts} attempt(s): {reason}")]
    GenerationInfeasible { attempts: u32, reason: String },

    /// The generator exceeded its soft deadline.
    #[error("generation exceeded soft deadline of {budget_ms}ms")]
    GenerationTimeout { budget_ms: u64 },
}

pub type GenResult<T> = Result<T, GenError>;
