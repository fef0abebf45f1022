use std::f64::consts::LN_2;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimError, ensure_positive};

/// -log2 of the smallest uniform fed to the Pareto inverse transform.
const PARETO_UNIFORM_FLOOR_LOG2: f64 = 53.0;

/// Upper bound on trials per run; one `Trial` is 24 bytes.
pub const MAX_TRIALS: u64 = 100_000_000;

/// Claim frequency: Poisson λ, the expected number of claims per simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    pub lambda: f64,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        FrequencyConfig { lambda: 2.0 }
    }
}

/// Two-component severity mixture.
///
/// With probability `gamma_weight` a claim is drawn from the Gamma body
/// (E[X] = shape × scale), otherwise from the Pareto tail
/// (E[X] = α·x_m / (α − 1), finite only for α > 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub gamma_shape: f64,
    pub gamma_scale: f64,
    /// Pareto minimum value x_m.
    pub pareto_scale: f64,
    /// Pareto tail index α.
    pub pareto_alpha: f64,
    /// Probability that a claim comes from the Gamma body, in [0, 1].
    pub gamma_weight: f64,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        // Gamma mean = 6_000; Pareto mean = 30_000.
        SeverityConfig {
            gamma_shape: 2.0,
            gamma_scale: 3_000.0,
            pareto_scale: 10_000.0,
            pareto_alpha: 1.5,
            gamma_weight: 0.95,
        }
    }
}

impl SeverityConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("gamma_shape", self.gamma_shape)?;
        ensure_positive("gamma_scale", self.gamma_scale)?;
        ensure_positive("pareto_scale", self.pareto_scale)?;
        ensure_positive("pareto_alpha", self.pareto_alpha)?;
        // Open01 never yields less than 2^-53, so the largest tail draw is x_m · 2^(53/α).
        // The 2^(53/α) factor must stay finite on its own too, or a tiny x_m hides it.
        let log_tail_factor = PARETO_UNIFORM_FLOOR_LOG2 * LN_2 / self.pareto_alpha;
        let log_max = f64::MAX.ln();
        if log_tail_factor >= log_max || self.pareto_scale.ln() + log_tail_factor >= log_max {
            return Err(SimError::InvalidConfiguration(format!(
                "pareto_alpha {} with pareto_scale {} can draw non-finite severities",
                self.pareto_alpha, self.pareto_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma_weight) {
            return Err(SimError::InvalidConfiguration(format!(
                "gamma_weight must lie in [0, 1], got {}",
                self.gamma_weight
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub trials: u64,
    pub frequency: FrequencyConfig,
    pub severity: SeverityConfig,
    /// VaR levels; TVaR is reported at the highest one.
    pub confidence_levels: Vec<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

impl SimulationConfig {
    /// 10k trials, λ = 2, 95% Gamma(2, 3_000) / 5% Pareto(10_000, 1.5), VaR at 95% and 99%.
    pub fn canonical() -> Self {
        SimulationConfig {
            seed: 42,
            trials: 10_000,
            frequency: FrequencyConfig::default(),
            severity: SeverityConfig::default(),
            confidence_levels: vec![0.95, 0.99],
        }
    }

    /// Read a JSON config. Absent fields take their canonical values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Check every parameter and normalise the confidence levels to
    /// ascending order without duplicates.
    pub fn validate(mut self) -> Result<Self> {
        if self.trials == 0 {
            return Err(SimError::InvalidInput("trial count must be at least 1".to_string()));
        }
        if self.trials > MAX_TRIALS {
            return Err(SimError::InvalidInput(format!(
                "trial count {} exceeds the limit of {MAX_TRIALS}",
                self.trials
            )));
        }
        ensure_positive("lambda", self.frequency.lambda)?;
        self.severity.validate()?;
        self.confidence_levels = normalise_levels(&self.confidence_levels)?;
        debug!(config = ?self, "configuration validated");
        Ok(self)
    }
}

/// Sort and dedup confidence levels, rejecting anything outside (0, 1).
pub fn normalise_levels(levels: &[f64]) -> Result<Vec<f64>> {
    if levels.is_empty() {
        return Err(SimError::InvalidConfiguration(
            "at least one confidence level is required".to_string(),
        ));
    }
    if let Some(bad) = levels.iter().find(|&&p| !(p > 0.0 && p < 1.0)) {
        return Err(SimError::InvalidConfiguration(format!(
            "confidence level must lie in (0, 1), got {bad}"
        )));
    }
    let mut out = levels.to_vec();
    out.sort_by(f64::total_cmp);
    out.dedup();
    Ok(out)
}
