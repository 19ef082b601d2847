//! Standard deviation helper shared by the band indicators.
//!
//! Population standard deviation over n closing prices:
//! STDDEV(n) = sqrt(sum((C[j] - SMA(n))^2 for j in 0..n) / n)

/// Population standard deviation of a non-empty sample.
pub fn population_stddev(sample: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = sample.clone().count() as f64;
    let mean = sample.clone().sum::<f64>() / n;
    let variance = sample.map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    variance.sqrt()
}
