//! Monte Carlo estimation of aggregate annual insurance losses.
//!
//! A Poisson claim count and a Gamma/Pareto mixture severity are compounded
//! into one total loss per simulated year; VaR and TVaR are read off the
//! resulting empirical distribution.

pub mod analysis;
pub mod config;
pub mod error;
pub mod frequency;
pub mod report;
pub mod severity;
pub mod simulation;
pub mod types;

pub use error::{Result, SimError};
