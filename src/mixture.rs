// Dirichlet-process-style mixture built on the Chinese restaurant process

use crate::crp::RestaurantProcess;
use crate::Result;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::marker::PhantomData;

/// A mixture sampler over an owned [`RestaurantProcess`].
///
/// Each table carries one latent parameter of type `P`, drawn lazily from
/// `parameter_source` at sampling time, and each customer contributes one
/// observation drawn from `likelihood_sampler` conditioned on its table's
/// parameter.  The output buffer is shuffled, so the final ordering carries
/// no table structure.
pub struct RestaurantMixture<P, G, S>
where
    G: FnMut(usize, &mut dyn RngCore) -> P,
    S: FnMut(&P, &mut dyn RngCore) -> f64,
{
    process: RestaurantProcess,
    parameter_source: G,
    likelihood_sampler: S,
    datapoints: Vec<f64>,
    _phantom: PhantomData<P>,
}

impl<P, G, S> RestaurantMixture<P, G, S>
where
    G: FnMut(usize, &mut dyn RngCore) -> P,
    S: FnMut(&P, &mut dyn RngCore) -> f64,
{
    /// Fails with [`CrpError::InvalidConcentration`] unless `alpha` is finite
    /// and strictly positive.
    ///
    /// [`CrpError::InvalidConcentration`]: crate::CrpError::InvalidConcentration
    pub fn new(alpha: f64, parameter_source: G, likelihood_sampler: S) -> Result<Self> {
        Ok(Self {
            process: RestaurantProcess::new(alpha)?,
            parameter_source,
            likelihood_sampler,
            datapoints: Vec::new(),
            _phantom: PhantomData,
        })
    }

    /// The underlying partition process, read-only.
    pub fn process(&self) -> &RestaurantProcess {
        &self.process
    }

    /// The observations from the most recent [`sample`](Self::sample) call,
    /// in shuffled order.  One per customer seated over the whole lifetime of
    /// the underlying process.
    pub fn datapoints(&self) -> &[f64] {
        &self.datapoints
    }

    /// Clear the output buffer.  The underlying partition process keeps its
    /// tables and history.
    pub fn reset(&mut self) {
        self.datapoints.clear();
    }

    /// Seat `sample_size` further customers and regenerate the output buffer
    /// over the entire accumulated partition.
    ///
    /// With `reset`, the buffer is cleared first; the partition itself is
    /// never restarted, so repeated calls compound it and the buffer always
    /// ends up with one observation per customer ever seated.  Parameters are
    /// redrawn fresh from the parameter source on every call.
    pub fn sample<T: Rng>(&mut self, sample_size: usize, reset: bool, rng: &mut T) {
        if reset && !self.datapoints.is_empty() {
            self.reset();
        }
        self.process.advance(sample_size, rng);

        let sizes = self.process.table_sizes();
        let mut params = Vec::with_capacity(sizes.len());
        for label in 0..sizes.len() {
            params.push((self.parameter_source)(label, &mut *rng));
        }

        let mut datapoints = Vec::with_capacity(self.process.n_customers());
        for (param, &size) in params.iter().zip(sizes.iter()) {
            for _ in 0..size {
                datapoints.push((self.likelihood_sampler)(param, &mut *rng));
            }
        }

        datapoints.shuffle(rng);
        self.datapoints = datapoints;
    }
}
