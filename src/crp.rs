// Chinese restaurant process

use crate::prelude::*;
use crate::{CrpError, Result};

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use statrs::function::gamma::ln_gamma;
use std::collections::BTreeMap;
use std::fmt;

/// An evolving random partition of the customers `1..n` into tables, grown
/// one customer at a time by the Chinese restaurant process.
///
/// Table labels are dense, assigned from 0 in creation order, and never
/// expire.  A snapshot of the table sizes is recorded into [`history`] before
/// every seating, so `history[i]` is the partition as of `i` customers seated.
///
/// [`history`]: RestaurantProcess::history
#[derive(Debug, Clone)]
pub struct RestaurantProcess {
    mass: Mass,
    tables: Vec<Vec<usize>>,
    history: Vec<BTreeMap<usize, usize>>,
    n: usize,
}

impl RestaurantProcess {
    /// Fails with [`CrpError::InvalidConcentration`] unless `alpha` is finite
    /// and strictly positive.
    pub fn new(alpha: f64) -> Result<Self> {
        Ok(Self::with_mass(Mass::new(alpha)?))
    }

    pub fn with_mass(mass: Mass) -> Self {
        Self {
            mass,
            tables: Vec::new(),
            history: Vec::new(),
            n: 1,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.mass.unwrap()
    }

    pub fn mass(&self) -> Mass {
        self.mass
    }

    /// Number of customers seated so far.
    pub fn n_customers(&self) -> usize {
        self.n - 1
    }

    pub fn n_tables(&self) -> usize {
        self.tables.len()
    }

    /// Customer indices at each table, in arrival order, indexed by table label.
    pub fn tables(&self) -> &[Vec<usize>] {
        &self.tables
    }

    /// Table labels in creation order.
    pub fn table_labels(&self) -> Vec<usize> {
        (0..self.tables.len()).collect()
    }

    /// Table sizes, aligned with [`table_labels`](Self::table_labels).
    pub fn table_sizes(&self) -> Vec<usize> {
        self.tables.iter().map(|table| table.len()).collect()
    }

    /// Mapping from table label to table size.
    pub fn table_size_map(&self) -> BTreeMap<usize, usize> {
        self.tables
            .iter()
            .enumerate()
            .map(|(label, table)| (label, table.len()))
            .collect()
    }

    /// Table-size snapshots, one per completed step, each captured before the
    /// seating that produced it.
    pub fn history(&self) -> &[BTreeMap<usize, usize>] {
        &self.history
    }

    /// The table label of each customer, in customer order.
    ///
    /// Because labels are assigned in creation order, this is the canonical
    /// (restricted growth) labeling of the partition.
    pub fn labels(&self) -> Vec<usize> {
        let mut labels = vec![0; self.n_customers()];
        for (label, table) in self.tables.iter().enumerate() {
            for &customer in table {
                labels[customer - 1] = label;
            }
        }
        labels
    }

    /// The probability of the next customer opening a new table, and the
    /// probabilities of joining each existing table *conditional on not
    /// opening a new one* (so the latter sum to one on their own; the
    /// unconditional probability of joining table `i` is
    /// `(1 - p_new) * p_existing[i]`).
    ///
    /// Fails with [`CrpError::EmptyState`] before the first seating, when the
    /// conditional weights are undefined.
    pub fn seating_weights(&self) -> Result<(f64, Vec<f64>)> {
        if self.tables.is_empty() {
            return Err(CrpError::EmptyState);
        }
        let seated = self.n_customers() as f64;
        let p_new = self.mass / (seated + self.mass);
        let p_existing = self
            .tables
            .iter()
            .map(|table| table.len() as f64 / seated)
            .collect();
        Ok((p_new, p_existing))
    }

    /// Seat the next `steps` customers, recording a snapshot of the table
    /// sizes before each seating.  Returns `self` so calls can be chained.
    ///
    /// `steps == 0` is a no-op.
    pub fn advance<T: Rng>(&mut self, steps: usize, rng: &mut T) -> &mut Self {
        for _ in 0..steps {
            self.history.push(self.table_size_map());
            self.step(rng);
        }
        self
    }

    fn step<T: Rng>(&mut self, rng: &mut T) {
        let seated = self.n_customers() as f64;
        let p_new = self.mass / (seated + self.mass);
        let u: f64 = rng.random();
        // The first customer always opens table 0: p_new = alpha / (0 + alpha) = 1.
        if u <= p_new {
            self.tables.push(vec![self.n]);
        } else {
            let dist = WeightedIndex::new(self.table_sizes()).unwrap();
            self.tables[dist.sample(rng)].push(self.n);
        }
        self.n += 1;
    }
}

impl fmt::Display for RestaurantProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chinese restaurant process")?;
        writeln!(f)?;
        writeln!(f, "alpha = {}", self.alpha())?;
        writeln!(f, "n     = {}", self.n_customers())?;
        writeln!(f)?;
        writeln!(f, "Number of tables = {}", self.n_tables())?;
        writeln!(f, "Number of customers at each table:")?;
        for (label, table) in self.tables.iter().enumerate() {
            writeln!(f, "{:>5}  {}", label, table.len())?;
        }
        Ok(())
    }
}

/// Log probability of a partition with the given table sizes under the
/// Chinese restaurant process, i.e. the exchangeable partition probability
/// `alpha^k * prod_j (size_j - 1)! * Gamma(alpha) / Gamma(alpha + n)`.
pub fn log_pmf(table_sizes: &[usize], mass: Mass) -> f64 {
    let ni: usize = table_sizes.iter().sum();
    let ns = table_sizes.len() as f64;
    let m = mass.unwrap();
    let mut result = ns * mass.ln() + ln_gamma(m) - ln_gamma(m + ni as f64);
    for &size in table_sizes {
        result += ln_gamma(size as f64);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_goodness_of_fit, assert_pmf_sums_to_one, sizes_from_labels};
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn test_invalid_concentration() {
        assert_eq!(
            RestaurantProcess::new(0.0).unwrap_err(),
            CrpError::InvalidConcentration(0.0)
        );
        assert_eq!(
            RestaurantProcess::new(-2.5).unwrap_err(),
            CrpError::InvalidConcentration(-2.5)
        );
    }

    #[test]
    fn test_fresh_state() {
        let crp = RestaurantProcess::new(1.0).unwrap();
        assert_eq!(crp.n_customers(), 0);
        assert_eq!(crp.n_tables(), 0);
        assert!(crp.history().is_empty());
        assert_eq!(crp.seating_weights().unwrap_err(), CrpError::EmptyState);
    }

    #[test]
    fn test_first_customer_always_opens_a_table() {
        for alpha in [1e-12, 0.5, 1.0, 1e12] {
            for seed in 0..20 {
                let rng = &mut Pcg64Mcg::seed_from_u64(seed);
                let mut crp = RestaurantProcess::new(alpha).unwrap();
                crp.advance(1, rng);
                assert_eq!(crp.tables(), &[vec![1]]);
            }
        }
    }

    #[test]
    fn test_sizes_account_for_every_customer() {
        let rng = &mut Pcg64Mcg::seed_from_u64(1);
        let mut crp = RestaurantProcess::new(2.5).unwrap();
        for _ in 0..10 {
            crp.advance(17, rng);
            assert_eq!(
                crp.table_sizes().iter().sum::<usize>(),
                crp.n_customers()
            );
            let mut seen: Vec<usize> = crp.tables().iter().flatten().copied().collect();
            seen.sort_unstable();
            let expected: Vec<usize> = (1..=crp.n_customers()).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_seating_weights_normalized() {
        let rng = &mut Pcg64Mcg::seed_from_u64(2);
        let mut crp = RestaurantProcess::new(3.0).unwrap();
        crp.advance(1, rng);
        while crp.n_customers() < 200 {
            let (p_new, p_existing) = crp.seating_weights().unwrap();
            assert!(p_new > 0.0 && p_new < 1.0);
            let total: f64 = p_existing.iter().sum();
            assert!((total - 1.0).abs() < 1e-10);
            crp.advance(1, rng);
        }
    }

    #[test]
    fn test_history_snapshots_lag_by_one() {
        let rng = &mut Pcg64Mcg::seed_from_u64(3);
        let mut crp = RestaurantProcess::new(1.5).unwrap();
        crp.advance(25, rng).advance(25, rng);
        assert_eq!(crp.history().len(), 50);
        for (i, snapshot) in crp.history().iter().enumerate() {
            assert_eq!(snapshot.values().sum::<usize>(), i);
        }
    }

    #[test]
    fn test_advance_zero_steps_is_a_noop() {
        let rng = &mut Pcg64Mcg::seed_from_u64(4);
        let mut crp = RestaurantProcess::new(1.0).unwrap();
        crp.advance(5, rng);
        let labels = crp.labels();
        crp.advance(0, rng);
        assert_eq!(crp.n_customers(), 5);
        assert_eq!(crp.history().len(), 5);
        assert_eq!(crp.labels(), labels);
    }

    #[test]
    fn test_tiny_mass_seats_everyone_together() {
        let rng = &mut Pcg64Mcg::seed_from_u64(5);
        let mut crp = RestaurantProcess::new(1e-12).unwrap();
        crp.advance(500, rng);
        assert_eq!(crp.n_tables(), 1);
        assert_eq!(crp.table_sizes(), vec![500]);
    }

    #[test]
    fn test_huge_mass_opens_a_table_per_customer() {
        let rng = &mut Pcg64Mcg::seed_from_u64(6);
        let mut crp = RestaurantProcess::new(1e9).unwrap();
        crp.advance(5, rng);
        assert_eq!(crp.n_tables(), 5);
        assert_eq!(crp.table_sizes(), vec![1, 1, 1, 1, 1]);
        assert_eq!(crp.labels(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_display_summary() {
        let rng = &mut Pcg64Mcg::seed_from_u64(7);
        let mut crp = RestaurantProcess::new(2.5).unwrap();
        crp.advance(30, rng);
        let summary = format!("{}", crp);
        assert!(summary.contains("alpha = 2.5"));
        assert!(summary.contains("n     = 30"));
        assert!(summary.contains(&format!("Number of tables = {}", crp.n_tables())));
    }

    #[test]
    fn test_goodness_of_fit_constructive() {
        let n_items = 5;
        let mass = Mass::new(2.0).unwrap();
        let rng = &mut Pcg64Mcg::seed_from_u64(8);
        let sample_closure = || {
            let mut crp = RestaurantProcess::with_mass(mass);
            crp.advance(n_items, rng);
            crp.labels()
        };
        let log_prob_closure = |labels: &[usize]| log_pmf(&sizes_from_labels(labels), mass);
        assert_goodness_of_fit(100000, n_items, sample_closure, log_prob_closure, 0.001);
    }

    #[test]
    fn test_pmf() {
        let mass = Mass::new(1.5).unwrap();
        let log_prob_closure = |labels: &[usize]| log_pmf(&sizes_from_labels(labels), mass);
        assert_pmf_sums_to_one(5, log_prob_closure, 0.0000001);
    }
}
