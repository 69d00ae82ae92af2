use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::{
    error::{DiceError, Result},
    statistics::roller::FaceGenerator,
};

/// Per-face counts over a batch of draws from a single die size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTally {
    sides: u32,
    counts: Vec<u64>,
}

impl FaceTally {
    pub fn new(sides: u32) -> Result<Self> {
        if sides < 1 {
            return Err(DiceError::invalid_argument("tally needs at least one side"));
        }
        Ok(Self {
            sides,
            counts: vec![0; sides as usize],
        })
    }

    /// Draws `draws` faces from `rng` and tallies them.
    pub fn from_draws<G>(rng: &mut G, sides: u32, draws: u64) -> Result<Self>
    where
        G: FaceGenerator + ?Sized,
    {
        let mut tally = Self::new(sides)?;
        for _ in 0..draws {
            tally.record(rng.generate(sides)?)?;
        }
        Ok(tally)
    }

    pub fn record(&mut self, face: u32) -> Result<()> {
        if face < 1 || face > self.sides {
            return Err(DiceError::invalid_argument(format!(
                "face {face} is outside [1, {}]",
                self.sides
            )));
        }
        self.counts[face as usize - 1] += 1;
        Ok(())
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn count(&self, face: u32) -> u64 {
        face.checked_sub(1)
            .and_then(|i| self.counts.get(i as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn expected_per_face(&self) -> f64 {
        self.total() as f64 / self.sides as f64
    }

    /// Largest `|observed - expected| / expected` over all faces.
    pub fn max_relative_deviation(&self) -> f64 {
        let expected = self.expected_per_face();
        if expected == 0.0 {
            return 0.0;
        }
        self.counts
            .iter()
            .map(|&c| (c as f64 - expected).abs() / expected)
            .fold(0.0, f64::max)
    }

    pub fn within_tolerance(&self, relative: f64) -> bool {
        self.max_relative_deviation() <= relative
    }

    /// Pearson's chi-squared statistic against a uniform distribution.
    pub fn chi_squared(&self) -> f64 {
        let expected = self.expected_per_face();
        if expected == 0.0 {
            return 0.0;
        }
        self.counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                diff * diff / expected
            })
            .sum()
    }

    /// Probability of a statistic at least this extreme under a fair die.
    pub fn p_value(&self) -> Result<f64> {
        if self.sides < 2 {
            return Ok(1.0);
        }
        let dist = ChiSquared::new((self.sides - 1) as f64)
            .map_err(|e| DiceError::invalid_argument(e.to_string()))?;
        Ok(1.0 - dist.cdf(self.chi_squared()))
    }
}
