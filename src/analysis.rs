use serde::Serialize;
use tracing::{debug, warn};

use crate::config::normalise_levels;
use crate::error::{Result, SimError};

/// Tail Value at Risk, or the explicit absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TailMetric {
    /// Mean of the losses strictly above the VaR threshold.
    Defined(f64),
    /// No loss lies strictly above `threshold`; the conditional mean does not exist.
    Undefined { threshold: f64 },
}

impl TailMetric {
    pub fn value(&self) -> Option<f64> {
        match self {
            TailMetric::Defined(v) => Some(*v),
            TailMetric::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, TailMetric::Defined(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarEstimate {
    pub level: f64,
    pub value: f64,
}

/// Summary risk metrics for one loss distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub n: usize,
    pub mean: f64,
    /// One entry per confidence level, ascending by level.
    pub var: Vec<VarEstimate>,
    /// Level at which `tvar` is measured (the highest configured level).
    pub tvar_level: f64,
    pub tvar: TailMetric,
}

impl RiskReport {
    /// Mean, VaR at every level and TVaR at the highest level.
    pub fn from_losses(losses: &[f64], levels: &[f64]) -> Result<Self> {
        let sorted = sorted_losses(losses)?;
        let levels = normalise_levels(levels)?;

        let var: Vec<VarEstimate> = levels
            .iter()
            .map(|&level| VarEstimate { level, value: percentile(&sorted, level) })
            .collect();
        // normalise_levels guarantees at least one level.
        let top = var[var.len() - 1];
        let tvar = tail_mean_above(&sorted, top.value);
        if !tvar.is_defined() {
            warn!(level = top.level, threshold = top.value, "no trial exceeds VaR; TVaR undefined");
        }

        let report = RiskReport {
            n: sorted.len(),
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            var,
            tvar_level: top.level,
            tvar,
        };
        debug!(?report, "risk metrics computed");
        Ok(report)
    }

    /// VaR at exactly `level`, if that level was requested.
    pub fn var_at(&self, level: f64) -> Option<f64> {
        self.var.iter().find(|v| v.level == level).map(|v| v.value)
    }
}

/// Arithmetic mean. Fails on an empty slice.
pub fn mean(losses: &[f64]) -> Result<f64> {
    if losses.is_empty() {
        return Err(empty_input());
    }
    Ok(losses.iter().sum::<f64>() / losses.len() as f64)
}

/// VaR(p): the p-th percentile, linearly interpolated between order statistics.
pub fn value_at_risk(losses: &[f64], p: f64) -> Result<f64> {
    check_level(p)?;
    Ok(percentile(&sorted_losses(losses)?, p))
}

/// TVaR(p): mean of the losses strictly greater than VaR(p).
pub fn tail_value_at_risk(losses: &[f64], p: f64) -> Result<TailMetric> {
    check_level(p)?;
    let sorted = sorted_losses(losses)?;
    Ok(tail_mean_above(&sorted, percentile(&sorted, p)))
}

/// Percentile of an ascending, non-empty slice with `h = p·(n − 1)`.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = p * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn tail_mean_above(sorted: &[f64], threshold: f64) -> TailMetric {
    let start = sorted.partition_point(|&x| x <= threshold);
    let tail = &sorted[start..];
    if tail.is_empty() {
        TailMetric::Undefined { threshold }
    } else {
        TailMetric::Defined(tail.iter().sum::<f64>() / tail.len() as f64)
    }
}

fn sorted_losses(losses: &[f64]) -> Result<Vec<f64>> {
    if losses.is_empty() {
        return Err(empty_input());
    }
    let mut sorted = losses.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn check_level(p: f64) -> Result<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfiguration(format!("confidence level must lie in (0, 1), got {p}")))
    }
}

fn empty_input() -> SimError {
    SimError::InvalidInput("loss distribution is empty".to_string())
}

/// Descriptive statistics of a loss distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistStats {
    pub n: usize,
    pub min: f64,
    pub p50: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Share of trials with no loss at all.
    pub zero_share: f64,
}

impl DistStats {
    pub fn from_losses(losses: &[f64]) -> Result<Self> {
        let sorted = sorted_losses(losses)?;
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let zeros = sorted.iter().take_while(|&&x| x == 0.0).count();

        Ok(DistStats {
            n,
            min: sorted[0],
            p50: percentile(&sorted, 0.5),
            max: sorted[n - 1],
            mean,
            std_dev: variance.sqrt(),
            zero_share: zeros as f64 / n as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn percentile_known_values() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(close(percentile(&v, 0.5), 3.0));
        assert!(close(percentile(&v, 0.95), 4.8));
        assert!(close(percentile(&v, 0.99), 4.96));
        assert!(close(percentile(&[7.0], 0.99), 7.0));
    }

    /// 1..=100: h = 0.95 × 99 = 94.05 → 95 + 0.05 × (96 − 95) = 95.05.
    #[test]
    fn var_interpolates_between_order_statistics() {
        let losses: Vec<f64> = (1..=100).rev().map(f64::from).collect();
        assert!(close(value_at_risk(&losses, 0.95).unwrap(), 95.05));
        assert!(close(value_at_risk(&losses, 0.99).unwrap(), 99.01));
    }

    #[test]
    fn tvar_is_mean_strictly_above_var() {
        let losses: Vec<f64> = (1..=100).map(f64::from).collect();
        // VaR(0.95) = 95.05; values above: 96..=100 → mean 98.
        assert_eq!(tail_value_at_risk(&losses, 0.95).unwrap(), TailMetric::Defined(98.0));
    }

    #[test]
    fn tvar_undefined_when_nothing_exceeds_threshold() {
        let losses = vec![0.0; 50];
        let tvar = tail_value_at_risk(&losses, 0.99).unwrap();
        assert_eq!(tvar, TailMetric::Undefined { threshold: 0.0 });
        assert_eq!(tvar.value(), None);
    }

    #[test]
    fn tvar_undefined_on_top_mass_point() {
        // Top 5 values tie at the maximum; VaR(0.99) equals it.
        let mut losses = vec![0.0; 95];
        losses.extend([1_000.0; 5]);
        assert!(!tail_value_at_risk(&losses, 0.99).unwrap().is_defined());
    }

    #[test]
    fn empty_distribution_is_invalid_input() {
        assert!(matches!(mean(&[]), Err(SimError::InvalidInput(_))));
        assert!(matches!(value_at_risk(&[], 0.95), Err(SimError::InvalidInput(_))));
        assert!(matches!(tail_value_at_risk(&[], 0.99), Err(SimError::InvalidInput(_))));
        assert!(matches!(
            RiskReport::from_losses(&[], &[0.95, 0.99]),
            Err(SimError::InvalidInput(_))
        ));
        assert!(matches!(DistStats::from_losses(&[]), Err(SimError::InvalidInput(_))));
    }

    #[test]
    fn level_outside_open_interval_rejected() {
        for p in [1.0, 1.5, -0.1, f64::NAN] {
            assert!(matches!(
                value_at_risk(&[1.0], p),
                Err(SimError::InvalidConfiguration(_))
            ));
        }
        assert!(matches!(
            RiskReport::from_losses(&[1.0], &[0.0]),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn report_orders_levels_and_measures_tvar_at_highest() {
        let losses: Vec<f64> = (1..=100).map(f64::from).collect();
        let report = RiskReport::from_losses(&losses, &[0.99, 0.95]).unwrap();
        assert_eq!(report.n, 100);
        assert!(close(report.mean, 50.5));
        assert_eq!(report.var.iter().map(|v| v.level).collect::<Vec<_>>(), vec![0.95, 0.99]);
        assert_eq!(report.tvar_level, 0.99);
        assert_eq!(report.tvar, TailMetric::Defined(100.0));
        assert!(close(report.var_at(0.95).unwrap(), 95.05));
        assert_eq!(report.var_at(0.5), None);
    }

    #[test]
    fn dist_stats_known_values() {
        let ds = DistStats::from_losses(&[0.0, 0.0, 3.0, 4.0, 8.0]).unwrap();
        assert_eq!(ds.n, 5);
        assert!(close(ds.min, 0.0));
        assert!(close(ds.max, 8.0));
        assert!(close(ds.p50, 3.0));
        assert!(close(ds.mean, 3.0));
        assert!(close(ds.std_dev, (44.0_f64 / 4.0).sqrt()));
        assert!(close(ds.zero_share, 0.4));
    }

    fn losses_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(prop_oneof![Just(0.0), 0.0..1.0e6], 1..400)
    }

    proptest! {
        #[test]
        fn var_is_monotone_in_level(losses in losses_strategy(), a in 0.01..0.99f64, b in 0.01..0.99f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(value_at_risk(&losses, lo).unwrap() <= value_at_risk(&losses, hi).unwrap());
        }

        #[test]
        fn tvar_never_below_var(losses in losses_strategy(), p in 0.5..0.999f64) {
            let var = value_at_risk(&losses, p).unwrap();
            if let TailMetric::Defined(tvar) = tail_value_at_risk(&losses, p).unwrap() {
                prop_assert!(tvar >= var);
            }
        }

        #[test]
        fn var_lies_within_sample_range(losses in losses_strategy(), p in 0.01..0.99f64) {
            let var = value_at_risk(&losses, p).unwrap();
            let min = losses.iter().copied().fold(f64::INFINITY, f64::min);
            let max = losses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(var >= min && var <= max);
        }

        #[test]
        fn result_ignores_input_order(mut losses in losses_strategy(), p in 0.5..0.999f64) {
            let before = RiskReport::from_losses(&losses, &[p]).unwrap();
            losses.reverse();
            let after = RiskReport::from_losses(&losses, &[p]).unwrap();
            prop_assert_eq!(before.var, after.var);
            prop_assert_eq!(before.tvar, after.tvar);
        }
    }
}
