use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::info;

use crate::analysis::RiskReport;
use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::frequency::ClaimCountGenerator;
use crate::severity::SeveritySampler;
use crate::types::{LossDistribution, Trial, TrialId};

/// Simulate one year: draw a claim count, then sum that many severities.
/// A zero count short-circuits to a loss of exactly 0.0 with no severity draw.
pub fn run_trial(
    id: TrialId,
    counts: &ClaimCountGenerator,
    severity: &SeveritySampler,
    rng: &mut impl Rng,
) -> Trial {
    let claim_count = counts.sample(rng);
    if claim_count == 0 {
        return Trial::quiet(id);
    }
    let total_loss = (0..claim_count).map(|_| severity.sample(rng)).sum();
    Trial { id, claim_count, total_loss }
}

/// Empty vector able to hold `n` trials without reallocating.
fn preallocate(n: usize) -> Result<Vec<Trial>> {
    let mut trials = Vec::new();
    trials.try_reserve_exact(n).map_err(|e| {
        SimError::InvalidInput(format!("cannot allocate {n} trials: {e}"))
    })?;
    Ok(trials)
}

/// Run `n` trials back to back on a single caller-owned random stream.
pub fn simulate_trials(
    n: usize,
    counts: &ClaimCountGenerator,
    severity: &SeveritySampler,
    rng: &mut impl Rng,
) -> Result<LossDistribution> {
    if n == 0 {
        return Err(SimError::InvalidInput("trial count must be at least 1".to_string()));
    }
    let mut trials = preallocate(n)?;
    for i in 0..n {
        trials.push(run_trial(TrialId(i as u64), counts, severity, rng));
    }
    LossDistribution::new(trials)
}

/// A validated, ready-to-run aggregate loss simulation.
///
/// Every trial draws from its own ChaCha20 stream: the configured seed with the
/// stream number set to the trial index. Streams never overlap, so trials are
/// independent and the output does not depend on how work is split across
/// threads.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    counts: ClaimCountGenerator,
    severity: SeveritySampler,
    n_trials: usize,
}

impl Simulation {
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        let config = config.validate()?;
        let counts = ClaimCountGenerator::new(config.frequency.lambda)?;
        let severity = SeveritySampler::new(&config.severity)?;
        // validate() caps trials at MAX_TRIALS, which fits in usize.
        let n_trials = config.trials as usize;
        Ok(Simulation { config, counts, severity, n_trials })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn trial_rng(&self, id: TrialId) -> ChaCha20Rng {
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        rng.set_stream(id.0);
        rng
    }

    /// Fill all trials in parallel.
    pub fn run(&self) -> Result<LossDistribution> {
        let started = Instant::now();
        info!(trials = self.n_trials, seed = self.config.seed, "simulation started");

        let mut trials = preallocate(self.n_trials)?;
        trials.resize(self.n_trials, Trial::quiet(TrialId(0)));
        trials.par_iter_mut().enumerate().for_each(|(i, slot)| {
            let id = TrialId(i as u64);
            let mut rng = self.trial_rng(id);
            *slot = run_trial(id, &self.counts, &self.severity, &mut rng);
        });

        let dist = LossDistribution::new(trials)?;
        info!(
            trials = dist.len(),
            claims = dist.total_claims(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation finished"
        );
        Ok(dist)
    }

    /// Same per-trial streams as [`Simulation::run`], on the calling thread.
    pub fn run_sequential(&self) -> Result<LossDistribution> {
        let mut trials = preallocate(self.n_trials)?;
        trials.extend((0..self.n_trials).map(|i| {
            let id = TrialId(i as u64);
            let mut rng = self.trial_rng(id);
            run_trial(id, &self.counts, &self.severity, &mut rng)
        }));
        LossDistribution::new(trials)
    }

    /// Risk metrics at the configured confidence levels.
    pub fn report(&self, dist: &LossDistribution) -> Result<RiskReport> {
        RiskReport::from_losses(&dist.losses(), &self.config.confidence_levels)
    }
}
