use crate::change_events::float_serde;
use float_ord::FloatOrd;
use serde::{Deserialize, Serialize};

/// Summary statistics of the change magnitudes of a cluster. Every value is rounded to three decimals
///
/// Undefined values are NaN, so two records holding one never compare equal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeStatistics {
    #[serde(with = "float_serde")]
    pub mean: f64,
    /// Sample standard deviation (`n - 1` in the denominator)
    #[serde(with = "float_serde")]
    pub std: f64,
    #[serde(with = "float_serde")]
    pub min: f64,
    #[serde(with = "float_serde")]
    pub max: f64,
    #[serde(with = "float_serde")]
    pub median: f64,
    #[serde(with = "float_serde")]
    pub quant90: f64,
    #[serde(with = "float_serde")]
    pub quant95: f64,
    #[serde(with = "float_serde")]
    pub quant99: f64,
}

impl Default for MagnitudeStatistics {
    fn default() -> Self {
        Self {
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            median: f64::NAN,
            quant90: f64::NAN,
            quant95: f64::NAN,
            quant99: f64::NAN,
        }
    }
}

impl MagnitudeStatistics {
    /// Computes the statistics over the given magnitudes. NaN magnitudes are ignored. Without any magnitude
    /// all statistics are NaN, with a single magnitude the standard deviation is NaN
    pub fn from_magnitudes(magnitudes: &[f64]) -> Self {
        let mut sorted = magnitudes
            .iter()
            .copied()
            .filter(|m| !m.is_nan())
            .collect::<Vec<_>>();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by_key(|m| FloatOrd(*m));

        let count = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / count;
        let variance = sorted.iter().map(|m| (m - mean) * (m - mean)).sum::<f64>() / (count - 1.0);

        Self {
            mean: round3(mean),
            std: round3(variance.sqrt()),
            min: round3(sorted[0]),
            max: round3(sorted[sorted.len() - 1]),
            median: round3(quantile(&sorted, 0.5)),
            quant90: round3(quantile(&sorted, 0.9)),
            quant95: round3(quantile(&sorted, 0.95)),
            quant99: round3(quantile(&sorted, 0.99)),
        }
    }

    /// Statistics in a fixed order together with their names
    pub fn named_values(&self) -> [(&'static str, f64); 8] {
        [
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("max", self.max),
            ("median", self.median),
            ("quant90", self.quant90),
            ("quant95", self.quant95),
            ("quant99", self.quant99),
        ]
    }
}

/// Quantile `q` of sorted, non-empty values with linear interpolation between the closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_two_magnitudes() {
        let stats = MagnitudeStatistics::from_magnitudes(&[3.0, 1.0]);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.std, 1.414);
        assert_eq!(stats.quant90, 2.8);
    }

    #[test]
    fn test_quantiles_interpolate() {
        let magnitudes = (1..=101).map(|m| m as f64).collect::<Vec<_>>();
        let stats = MagnitudeStatistics::from_magnitudes(&magnitudes);
        assert_eq!(stats.median, 51.0);
        assert_eq!(stats.quant90, 91.0);
        assert_eq!(stats.quant95, 96.0);
        assert_eq!(stats.quant99, 100.0);
        assert_approx_eq!(stats.std, 29.3, 1e-3);
    }

    #[test]
    fn test_rounding() {
        let stats = MagnitudeStatistics::from_magnitudes(&[0.12345, 0.12345, 0.12345]);
        assert_eq!(stats.mean, 0.123);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = MagnitudeStatistics::from_magnitudes(&[]);
        assert!(empty.mean.is_nan());
        assert!(empty.quant99.is_nan());

        let single = MagnitudeStatistics::from_magnitudes(&[-0.5]);
        assert_eq!(single.mean, -0.5);
        assert_eq!(single.median, -0.5);
        assert!(single.std.is_nan());
        let copy = single;
        assert_ne!(single, copy);

        let pair = MagnitudeStatistics::from_magnitudes(&[1.0, 2.0]);
        let copy = pair;
        assert_eq!(pair, copy);
    }
}
