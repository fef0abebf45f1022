use rand::Rng;
use rand::distr::Open01;
use rand_distr::{Distribution, Gamma};

use crate::config::SeverityConfig;
use crate::error::{Result, SimError};

/// Which mixture component produced a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityBranch {
    /// Gamma body: ordinary claims.
    Body,
    /// Pareto tail: catastrophic claims.
    Tail,
}

/// Gamma/Pareto mixture claim-size sampler.
///
/// Stateless between draws: each call consumes fresh randomness from the
/// caller's stream and nothing else, so draws are i.i.d.
#[derive(Debug, Clone)]
pub struct SeveritySampler {
    body: Gamma<f64>,
    pareto_scale: f64,
    inv_alpha: f64,
    gamma_weight: f64,
}

impl SeveritySampler {
    pub fn new(config: &SeverityConfig) -> Result<Self> {
        config.validate()?;
        let body = Gamma::new(config.gamma_shape, config.gamma_scale).map_err(|e| {
            SimError::InvalidConfiguration(format!("gamma severity: {e}"))
        })?;
        Ok(SeveritySampler {
            body,
            pareto_scale: config.pareto_scale,
            inv_alpha: 1.0 / config.pareto_alpha,
            gamma_weight: config.gamma_weight,
        })
    }

    /// Draw one claim size.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.sample_branch(rng).0
    }

    /// Draw one claim size together with the component it came from.
    pub fn sample_branch(&self, rng: &mut impl Rng) -> (f64, SeverityBranch) {
        let u: f64 = rng.random();
        if u <= self.gamma_weight {
            // Very small shapes can underflow to 0.0.
            let x: f64 = self.body.sample(rng);
            (x.max(f64::MIN_POSITIVE), SeverityBranch::Body)
        } else {
            (self.pareto(rng), SeverityBranch::Tail)
        }
    }

    /// Inverse-transform Pareto draw: x_m / v^(1/α).
    /// `v` comes from the open interval (0, 1); `SeverityConfig::validate` bounds
    /// x_m / v^(1/α) below `f64::MAX` for the smallest such `v`.
    fn pareto(&self, rng: &mut impl Rng) -> f64 {
        let v: f64 = rng.sample(Open01);
        self.pareto_scale / v.powf(self.inv_alpha)
    }
}
