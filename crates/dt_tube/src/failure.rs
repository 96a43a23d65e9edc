//! Per-operation random failure.
//!
//! Filtering and amplification fail independently for every distinct
//! molecule with a fixed probability. A failure is not an error: the
//! operation simply did nothing to that molecule.
//!

use std::fmt;
use std::error;
use rand::Rng;

/// Failure probabilities of the two unreliable lab operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureRates {
    filter: f64,
    amplify: f64,
}

impl FailureRates {
    pub fn new(filter: f64, amplify: f64) -> Result<Self, RateError> {
        check_rate("filter", filter)?;
        check_rate("amplify", amplify)?;
        Ok(Self { filter, amplify })
    }

    /// Nothing ever fails.
    pub const fn none() -> Self {
        Self { filter: 0.0, amplify: 0.0 }
    }

    /// Probability that a matching molecule is lost during `filter`.
    pub fn filter(&self) -> f64 {
        self.filter
    }

    /// Probability that a matching molecule is not amplified.
    pub fn amplify(&self) -> f64 {
        self.amplify
    }
}

impl Default for FailureRates {
    fn default() -> Self {
        Self { filter: 0.01, amplify: 0.01 }
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), RateError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RateError::OutOfRange { name, value })
    }
}

/// One Bernoulli draw: true if the operation went through.
#[inline]
pub fn succeeds<R: Rng>(rng: &mut R, failure_rate: f64) -> bool {
    rng.random::<f64>() >= failure_rate
}

/// Error type for failure rate configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum RateError {
    /// A rate outside of [0, 1] (or NaN).
    OutOfRange { name: &'static str, value: f64 },
}

impl fmt::Display for RateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { name, value } => 
                write!(f, "Invalid {name} failure rate: {value} (must be within [0, 1])"),
        }
    }
}

impl error::Error for RateError {}
