use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::error::{Result, SimError, ensure_positive};

/// Poisson(λ) claim counts, one draw per simulated year.
#[derive(Debug, Clone)]
pub struct ClaimCountGenerator {
    poisson: Poisson<f64>,
    lambda: f64,
}

impl ClaimCountGenerator {
    pub fn new(lambda: f64) -> Result<Self> {
        ensure_positive("lambda", lambda)?;
        let poisson = Poisson::new(lambda)
            .map_err(|e| SimError::InvalidConfiguration(format!("poisson frequency: {e}")))?;
        Ok(ClaimCountGenerator { poisson, lambda })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn sample(&self, rng: &mut impl Rng) -> u64 {
        // rand_distr yields whole numbers as f64.
        let k: f64 = self.poisson.sample(rng);
        k as u64
    }
}
