use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::Distribution;

use crate::error::{DiceError, Result};

/// A source of uniformly distributed die faces.
pub trait FaceGenerator {
    /// Returns a face in `[1, sides]`.
    fn generate(&mut self, sides: u32) -> Result<u32>;
}

#[derive(Debug)]
pub struct Roller {
    rng: StdRng,
}

impl Roller {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let rng = StdRng::from_os_rng();
        Roller { rng }
    }

    /// Creates a new `Roller` instance with a different random seed.
    /// Useful for handing each die its own generator without touching the parent's sequence.
    pub fn fork(&mut self) -> Self {
        let mut seed = [0u8; 32];
        self.rng.fill(&mut seed);
        let rng = StdRng::from_seed(seed);
        Roller { rng }
    }

    pub fn from_seed(seed: u64) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        Roller { rng }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    #[cfg(test)]
    pub fn test_rng() -> Self {
        Self::from_seed(42)
    }
}

impl FaceGenerator for Roller {
    fn generate(&mut self, sides: u32) -> Result<u32> {
        if sides < 1 {
            return Err(DiceError::invalid_argument(format!(
                "a die needs at least one side, got {sides}"
            )));
        }
        let die = rand_distr::Uniform::new_inclusive(1, sides)
            .map_err(|e| DiceError::invalid_argument(e.to_string()))?;
        Ok(die.sample(&mut self.rng))
    }
}
