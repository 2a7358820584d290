use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::HashMap;

/// All partitions of `n_items` items, each as its canonical labeling: item 0
/// gets label 0 and every later item gets either an already-used label or the
/// smallest unused one (a restricted growth string).
pub fn iter_partitions(n_items: usize) -> Vec<Vec<usize>> {
    fn build(labels: &mut Vec<usize>, item: usize, n_used: usize, out: &mut Vec<Vec<usize>>) {
        if item == labels.len() {
            out.push(labels.clone());
            return;
        }
        for label in 0..=n_used {
            labels[item] = label;
            let n_used = if label == n_used { n_used + 1 } else { n_used };
            build(labels, item + 1, n_used, out);
        }
    }
    let mut out = Vec::new();
    if n_items == 0 {
        out.push(Vec::new());
        return out;
    }
    let mut labels = vec![0; n_items];
    build(&mut labels, 1, 1, &mut out);
    out
}

/// Table sizes of a labeled partition, indexed by label.
pub fn sizes_from_labels(labels: &[usize]) -> Vec<usize> {
    let mut sizes = Vec::new();
    for &label in labels {
        if label >= sizes.len() {
            sizes.resize(label + 1, 0);
        }
        sizes[label] += 1;
    }
    sizes
}

/// Chi-squared goodness-of-fit test of sampled partitions against `log_pmf`,
/// pooling adjacent partitions until each bin has expected count at least 5.
/// Panics if the test rejects at the given significance level.
pub fn assert_goodness_of_fit(
    n_samples: usize,
    n_items: usize,
    mut sample: impl FnMut() -> Vec<usize>,
    log_pmf: impl Fn(&[usize]) -> f64,
    significance: f64,
) {
    let ns = n_samples as f64;
    let mut map = HashMap::new();
    for _ in 0..n_samples {
        *map.entry(sample()).or_insert(0_usize) += 1;
    }
    let threshold = 5.0;
    let mut chisq = 0.0;
    let mut df = 0;
    let mut observed = 0;
    let mut expected = 0.0;
    for labels in iter_partitions(n_items) {
        observed += map.get(&labels).copied().unwrap_or(0);
        expected += ns * log_pmf(&labels).exp();
        if expected >= threshold {
            let o = observed as f64;
            chisq += (o - expected) * (o - expected) / expected;
            df += 1;
            observed = 0;
            expected = 0.0;
        }
    }
    let distr = ChiSquared::new((df - 1) as f64).unwrap();
    let p_value = 1.0 - distr.cdf(chisq);
    assert!(
        p_value > significance,
        "Rejected goodness of fit test... p-value: {:.8}, chisq: {:.2}, df: {}",
        p_value,
        chisq,
        df
    );
}

pub fn assert_pmf_sums_to_one(n_items: usize, log_pmf: impl Fn(&[usize]) -> f64, epsilon: f64) {
    let sum: f64 = iter_partitions(n_items)
        .iter()
        .map(|labels| log_pmf(labels).exp())
        .sum();
    assert!(
        (1.0 - epsilon..=1.0 + epsilon).contains(&sum),
        "Total probability should be one, but is {}.",
        sum
    );
}
