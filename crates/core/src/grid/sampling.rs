//! Environmental field sampling
//!
//! Before a run the landscape needs three static fields:
//!
//! - `L`: landcover, drawn per pixel from the proportions of its biome
//! - `A`: activation energy, drawn from the distribution of each landcover
//! - `R`: released energy, drawn the same way as `A`
//!
//! The landscape reaches these through the [`FieldSampler`] trait so callers
//! can plug in their own generators. [`DistributionSampler`] is the default
//! implementation driven by per-biome proportions and per-landcover
//! [`EnergyDistribution`]s.

use super::{Biome, Grid, Landcover};
use crate::error::{FireSpreadError, Result};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of the static fields consumed by a landscape reset
///
/// Each method overwrites every cell of its output grid. Implementations must
/// produce exactly one sample per pixel.
pub trait FieldSampler: Send {
    /// Fill `landcover` from the biome map
    ///
    /// # Errors
    ///
    /// Implementations report biome ids they cannot sample.
    fn sample_landcover(
        &mut self,
        biomes: &Grid<Biome>,
        landcover: &mut Grid<Landcover>,
    ) -> Result<()>;

    /// Fill `activation` from the landcover map
    ///
    /// # Errors
    ///
    /// Implementations report landcover ids they cannot sample.
    fn sample_activation(
        &mut self,
        landcover: &Grid<Landcover>,
        activation: &mut Grid<f64>,
    ) -> Result<()>;

    /// Fill `release` from the landcover map
    ///
    /// # Errors
    ///
    /// Implementations report landcover ids they cannot sample.
    fn sample_release(
        &mut self,
        landcover: &Grid<Landcover>,
        release: &mut Grid<f64>,
    ) -> Result<()>;
}

/// One-dimensional distribution of activation or release energy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnergyDistribution {
    /// Always the same value
    Constant {
        /// The value
        value: f64,
    },
    /// Uniform on `[low, high)`
    Uniform {
        /// Lower bound (inclusive)
        low: f64,
        /// Upper bound (exclusive)
        high: f64,
    },
    /// Gaussian
    Normal {
        /// Mean
        mean: f64,
        /// Standard deviation
        std_dev: f64,
    },
    /// `exp(N(mu, sigma))`
    LogNormal {
        /// Mean of the underlying normal
        mu: f64,
        /// Standard deviation of the underlying normal
        sigma: f64,
    },
}

/// Standard normal sample via the Box-Muller transform
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

impl EnergyDistribution {
    /// Check parameters are finite and well ordered.
    ///
    /// # Errors
    ///
    /// [`FireSpreadError::InvalidConfig`] describing the bad parameter.
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            EnergyDistribution::Constant { value } => value.is_finite(),
            EnergyDistribution::Uniform { low, high } => {
                low.is_finite() && high.is_finite() && low <= high
            }
            EnergyDistribution::Normal { mean, std_dev } => {
                mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0
            }
            EnergyDistribution::LogNormal { mu, sigma } => {
                mu.is_finite() && sigma.is_finite() && sigma >= 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(FireSpreadError::InvalidConfig(format!(
                "invalid energy distribution parameters: {self:?}"
            )))
        }
    }

    /// Draw one value
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            EnergyDistribution::Constant { value } => value,
            EnergyDistribution::Uniform { low, high } => {
                if low < high {
                    rng.random_range(low..high)
                } else {
                    low
                }
            }
            EnergyDistribution::Normal { mean, std_dev } => {
                mean + std_dev * standard_normal(rng)
            }
            EnergyDistribution::LogNormal { mu, sigma } => {
                (mu + sigma * standard_normal(rng)).exp()
            }
        }
    }

    /// Draw exactly `n` values
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample_one(rng)).collect()
    }
}

/// Group flat indices of a class map by class id.
///
/// Fails on the first id with no bucket.
fn bucket_by_class(classes: &[u8], n_classes: usize, what: &str) -> Result<Vec<Vec<usize>>> {
    let mut buckets = vec![Vec::new(); n_classes];
    for (idx, &class) in classes.iter().enumerate() {
        let bucket = buckets.get_mut(usize::from(class)).ok_or_else(|| {
            FireSpreadError::InvalidConfig(format!(
                "{what} id {class} has no sampling distribution ({n_classes} configured)"
            ))
        })?;
        bucket.push(idx);
    }
    Ok(buckets)
}

/// Default [`FieldSampler`] driven by proportions and distributions
#[derive(Debug, Clone)]
pub struct DistributionSampler {
    /// Landcover choice per biome
    landcover_choice: Vec<WeightedIndex<f64>>,
    /// Energy distributions indexed by landcover id
    activation: Vec<EnergyDistribution>,
    release: Vec<EnergyDistribution>,
    rng: StdRng,
}

impl DistributionSampler {
    /// Create a sampler.
    ///
    /// # Arguments
    ///
    /// * `landcover_proportions` - `p[b][l]`: share of biome `b` covered by landcover `l`
    /// * `activation` - Activation energy distribution per landcover
    /// * `release` - Released energy distribution per landcover
    /// * `seed` - Fixed seed for reproducible fields, or `None` for OS entropy
    ///
    /// # Errors
    ///
    /// [`FireSpreadError::InvalidConfig`] if proportions are empty, ragged or
    /// not a valid weighting, or if the distribution counts do not match the
    /// number of landcover classes.
    pub fn new(
        landcover_proportions: &[Vec<f64>],
        activation: Vec<EnergyDistribution>,
        release: Vec<EnergyDistribution>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let n_landcovers = landcover_proportions.first().map_or(0, Vec::len);
        if n_landcovers == 0 {
            return Err(FireSpreadError::InvalidConfig(
                "at least one biome with at least one landcover class is required".into(),
            ));
        }
        if n_landcovers > usize::from(Landcover::MAX) + 1 {
            return Err(FireSpreadError::InvalidConfig(format!(
                "{n_landcovers} landcover classes exceed the representable range"
            )));
        }

        let mut landcover_choice = Vec::with_capacity(landcover_proportions.len());
        for (biome, proportions) in landcover_proportions.iter().enumerate() {
            if proportions.len() != n_landcovers {
                return Err(FireSpreadError::InvalidConfig(format!(
                    "biome {biome} lists {} landcover proportions, expected {n_landcovers}",
                    proportions.len()
                )));
            }
            let choice = WeightedIndex::new(proportions).map_err(|e| {
                FireSpreadError::InvalidConfig(format!("biome {biome} proportions: {e}"))
            })?;
            landcover_choice.push(choice);
        }

        for (name, distributions) in [("activation", &activation), ("release", &release)] {
            if distributions.len() != n_landcovers {
                return Err(FireSpreadError::InvalidConfig(format!(
                    "{} {name} distributions for {n_landcovers} landcover classes",
                    distributions.len()
                )));
            }
            for distribution in distributions {
                distribution.validate()?;
            }
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            landcover_choice,
            activation,
            release,
            rng,
        })
    }

    /// Number of biome classes
    #[must_use]
    pub fn n_biomes(&self) -> usize {
        self.landcover_choice.len()
    }

    /// Number of landcover classes
    #[must_use]
    pub fn n_landcovers(&self) -> usize {
        self.activation.len()
    }

    fn fill_energy(
        rng: &mut StdRng,
        distributions: &[EnergyDistribution],
        landcover: &Grid<Landcover>,
        out: &mut Grid<f64>,
    ) -> Result<()> {
        landcover.check_shape(out)?;
        let buckets = bucket_by_class(landcover.as_slice(), distributions.len(), "landcover")?;
        let data = out.as_mut_slice();
        for (distribution, indices) in distributions.iter().zip(buckets) {
            let samples = distribution.sample(rng, indices.len());
            for (idx, value) in indices.into_iter().zip(samples) {
                data[idx] = value;
            }
        }
        Ok(())
    }
}

impl FieldSampler for DistributionSampler {
    fn sample_landcover(
        &mut self,
        biomes: &Grid<Biome>,
        landcover: &mut Grid<Landcover>,
    ) -> Result<()> {
        biomes.check_shape(landcover)?;
        let buckets = bucket_by_class(biomes.as_slice(), self.n_biomes(), "biome")?;
        let data = landcover.as_mut_slice();
        for (choice, indices) in self.landcover_choice.iter().zip(buckets) {
            for idx in indices {
                // Bounded by n_landcovers, which fits in a Landcover
                data[idx] = choice.sample(&mut self.rng) as Landcover;
            }
        }
        debug!(
            "Sampled landcover for {} pixels across {} biomes",
            data.len(),
            self.n_biomes()
        );
        Ok(())
    }

    fn sample_activation(
        &mut self,
        landcover: &Grid<Landcover>,
        activation: &mut Grid<f64>,
    ) -> Result<()> {
        Self::fill_energy(&mut self.rng, &self.activation, landcover, activation)
    }

    fn sample_release(
        &mut self,
        landcover: &Grid<Landcover>,
        release: &mut Grid<f64>,
    ) -> Result<()> {
        Self::fill_energy(&mut self.rng, &self.release, landcover, release)
    }
}
