//! Text and CSV presentation of a simulated loss distribution.
//!
//! Nothing here feeds back into the engine; it only reads a
//! [`LossDistribution`] and its [`RiskReport`].

use std::fmt::Write as _;
use std::io::{self, Write};

use serde::Serialize;

use crate::analysis::{DistStats, RiskReport, TailMetric};
use crate::types::LossDistribution;

/// Euro amount with thousands separators and two decimals, e.g. `€12,345.67`.
pub fn format_eur(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("€{amount}");
    }
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}€{grouped}.{frac_part}")
}

fn pct(level: f64) -> String {
    let p = level * 100.0;
    if (p - p.round()).abs() < 1e-9 { format!("{p:.0}%") } else { format!("{p}%") }
}

/// Human-readable TVaR, labelling the undefined case instead of printing a number.
pub fn describe_tvar(tvar: &TailMetric) -> String {
    match tvar {
        TailMetric::Defined(v) => format_eur(*v),
        TailMetric::Undefined { threshold } => {
            format!("insufficient tail data (no trial above {})", format_eur(*threshold))
        }
    }
}

pub fn format_summary(report: &RiskReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Mean annual loss: {}", format_eur(report.mean));
    for v in &report.var {
        let _ = writeln!(out, "Value at Risk ({}): {}", pct(v.level), format_eur(v.value));
    }
    let _ = writeln!(
        out,
        "Tail Value at Risk ({}): {}",
        pct(report.tvar_level),
        describe_tvar(&report.tvar)
    );
    out
}

pub fn format_stats(stats: &DistStats) -> String {
    format!(
        "Trials: {}  zero-loss: {:.1}%  min: {}  median: {}  max: {}  std dev: {}\n",
        stats.n,
        stats.zero_share * 100.0,
        format_eur(stats.min),
        format_eur(stats.p50),
        format_eur(stats.max),
        format_eur(stats.std_dev),
    )
}

/// Equal-width binning of total losses between the sample minimum and maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub width: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub const DEFAULT_BINS: usize = 60;

    /// Returns `None` for an empty slice or zero bins.
    pub fn from_losses(losses: &[f64], bins: usize) -> Option<Self> {
        if losses.is_empty() || bins == 0 {
            return None;
        }
        let min = losses.iter().copied().fold(f64::INFINITY, f64::min);
        let max = losses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // A degenerate sample still gets one non-zero-width bin.
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut hist = Histogram { min, width, counts: vec![0; bins] };
        for &x in losses {
            let i = hist.bin_of(x);
            hist.counts[i] += 1;
        }
        Some(hist)
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Index of the bin containing `x`, clamped to the outer bins.
    pub fn bin_of(&self, x: f64) -> usize {
        let raw = ((x - self.min) / self.width).floor();
        if raw <= 0.0 { 0 } else { (raw as usize).min(self.bins() - 1) }
    }

    pub fn bin_range(&self, i: usize) -> (f64, f64) {
        let lo = self.min + self.width * i as f64;
        (lo, lo + self.width)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Horizontal bar chart with a marker on each bin that contains a VaR level.
pub fn render_histogram(hist: &Histogram, report: &RiskReport, bar_width: usize) -> String {
    let peak = hist.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut out = String::new();
    let _ = writeln!(out, "Simulated annual aggregate loss distribution ({} trials)", hist.total());

    for (i, &count) in hist.counts.iter().enumerate() {
        let (lo, hi) = hist.bin_range(i);
        let len = (count as f64 / peak as f64 * bar_width as f64).round() as usize;
        let markers: Vec<String> = report
            .var
            .iter()
            .filter(|v| hist.bin_of(v.value) == i)
            .map(|v| format!("VaR {} ≈ {}", pct(v.level), format_eur(v.value.round())))
            .collect();
        let _ = write!(
            out,
            "{:>16} – {:<16} | {:<bar_width$} {count:>6}",
            format_eur(lo.round()),
            format_eur(hi.round()),
            "#".repeat(len),
        );
        if !markers.is_empty() {
            let _ = write!(out, "  <- {}", markers.join(", "));
        }
        out.push('\n');
    }
    out
}

/// One row per trial: `simulation,num_claims,total_loss`.
pub fn write_trials_csv<W: Write>(mut w: W, dist: &LossDistribution) -> io::Result<()> {
    writeln!(w, "simulation,num_claims,total_loss")?;
    for t in dist.trials() {
        writeln!(w, "{},{},{:.6}", t.id.0, t.claim_count, t.total_loss)?;
    }
    w.flush()
}
