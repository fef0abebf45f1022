use serde::Serialize;

use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TrialId(pub u64);

/// One simulated year.
/// `total_loss` is exactly 0.0 when `claim_count` is 0; no severity is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trial {
    pub id: TrialId,
    pub claim_count: u64,
    pub total_loss: f64,
}

impl Trial {
    pub fn quiet(id: TrialId) -> Self {
        Trial { id, claim_count: 0, total_loss: 0.0 }
    }
}

/// The empirical aggregate-loss distribution produced by one simulation run.
///
/// Trials are stored in trial-index order, though nothing downstream depends
/// on that order. The collection is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LossDistribution {
    trials: Vec<Trial>,
}

impl LossDistribution {
    /// Wrap a completed set of trials. An empty set is rejected.
    pub fn new(trials: Vec<Trial>) -> Result<Self> {
        if trials.is_empty() {
            return Err(SimError::InvalidInput(
                "loss distribution must contain at least one trial".to_string(),
            ));
        }
        Ok(LossDistribution { trials })
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Per-trial total losses, one value per trial.
    pub fn losses(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.total_loss).collect()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Sum of claim counts across all trials.
    pub fn total_claims(&self) -> u64 {
        self.trials.iter().map(|t| t.claim_count).sum()
    }
}
