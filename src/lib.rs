//! Sequential simulation of the Chinese restaurant process, plus a
//! Dirichlet-process-style mixture sampler built on top of it.
//!
//! The [`crp::RestaurantProcess`] seats customers one at a time, either at a
//! new table (with probability `alpha / (n + alpha)`) or at an existing table
//! with probability proportional to its size, recording a snapshot of the
//! table sizes before every seating.  The [`mixture::RestaurantMixture`]
//! drives a restaurant process and emits one observation per customer, drawn
//! from a caller-supplied likelihood conditioned on that customer's table's
//! parameter.
//!
//! ```
//! use crp_mixture::crp::RestaurantProcess;
//! use rand::SeedableRng;
//!
//! let rng = &mut rand_pcg::Pcg64Mcg::seed_from_u64(42);
//! let mut crp = RestaurantProcess::new(2.5).unwrap();
//! crp.advance(100, rng);
//! assert_eq!(crp.table_sizes().iter().sum::<usize>(), 100);
//! assert_eq!(crp.history().len(), 100);
//! ```

#![forbid(unsafe_code)]

pub mod crp;
pub mod mixture;
pub mod prelude;
pub mod testing;

use thiserror::Error;

/// Errors for the restaurant process and mixture sampler.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrpError {
    #[error("concentration parameter must be finite and strictly positive, got {0}")]
    InvalidConcentration(f64),

    #[error("no customers have been seated yet")]
    EmptyState,
}

pub type Result<T> = std::result::Result<T, CrpError>;
