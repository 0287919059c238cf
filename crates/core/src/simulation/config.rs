//! Landscape configuration and presets
//!
//! A [`LandscapeConfig`] describes how the static fields of a landscape are
//! sampled (landcover proportions per biome, energy distributions per
//! landcover) and which propagation backend drives generation steps. It
//! deserializes from any serde format.

use crate::error::{FireSpreadError, Result};
use crate::grid::{DistributionSampler, EnergyDistribution};
use crate::solver::PropagationBackend;
use serde::{Deserialize, Serialize};

/// Sampling and propagation settings for a landscape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeConfig {
    /// `landcover_proportions[b][l]`: share of biome `b` covered by landcover `l`
    pub landcover_proportions: Vec<Vec<f64>>,
    /// Activation energy distribution per landcover
    pub activation: Vec<EnergyDistribution>,
    /// Released energy distribution per landcover
    pub release: Vec<EnergyDistribution>,
    /// Fixed RNG seed; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
    /// Generation step strategy
    #[serde(default)]
    pub backend: PropagationBackend,
}

impl LandscapeConfig {
    /// One biome made entirely of landcover `1`.
    ///
    /// Landcover `0` is kept as the bare class with zero proportion so that
    /// ids line up with the inflammable convention.
    #[must_use]
    pub fn uniform(activation: EnergyDistribution, release: EnergyDistribution) -> Self {
        let bare = EnergyDistribution::Constant { value: 0.0 };
        Self {
            landcover_proportions: vec![vec![0.0, 1.0]],
            activation: vec![bare, activation],
            release: vec![bare, release],
            seed: None,
            backend: PropagationBackend::default(),
        }
    }

    /// Two biomes over bare ground, grass and forest.
    ///
    /// Biome `0` is developed land (mostly bare with patches of grass),
    /// biome `1` is wildland (grass and forest). Grass ignites easily and
    /// releases little, forest is harder to ignite and releases more.
    #[must_use]
    pub fn wildland_urban_interface() -> Self {
        let bare = EnergyDistribution::Constant { value: 0.0 };
        Self {
            landcover_proportions: vec![vec![0.7, 0.25, 0.05], vec![0.05, 0.45, 0.5]],
            activation: vec![
                bare,
                EnergyDistribution::Uniform {
                    low: 0.02,
                    high: 0.06,
                },
                EnergyDistribution::Normal {
                    mean: 0.12,
                    std_dev: 0.02,
                },
            ],
            release: vec![
                bare,
                EnergyDistribution::Uniform {
                    low: 0.6,
                    high: 1.0,
                },
                EnergyDistribution::LogNormal {
                    mu: 0.4,
                    sigma: 0.25,
                },
            ],
            seed: None,
            backend: PropagationBackend::default(),
        }
    }

    /// Same configuration with a fixed seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same configuration with another propagation backend
    #[must_use]
    pub fn with_backend(mut self, backend: PropagationBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Number of biome classes described
    #[must_use]
    pub fn n_biomes(&self) -> usize {
        self.landcover_proportions.len()
    }

    /// Number of landcover classes described
    #[must_use]
    pub fn n_landcovers(&self) -> usize {
        self.activation.len()
    }

    /// Check the configuration is internally consistent.
    ///
    /// Proportions must be non-empty, rectangular, finite, non-negative and
    /// sum to a positive value per biome. There must be one activation and
    /// one release distribution per landcover, each with valid parameters.
    ///
    /// # Errors
    ///
    /// [`FireSpreadError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.landcover_proportions.first() else {
            return Err(FireSpreadError::InvalidConfig(
                "no biome landcover proportions".into(),
            ));
        };
        let n_landcovers = first.len();
        if n_landcovers == 0 {
            return Err(FireSpreadError::InvalidConfig(
                "biome 0 lists no landcover proportions".into(),
            ));
        }

        for (biome, proportions) in self.landcover_proportions.iter().enumerate() {
            if proportions.len() != n_landcovers {
                return Err(FireSpreadError::InvalidConfig(format!(
                    "biome {biome} lists {} landcover proportions, expected {n_landcovers}",
                    proportions.len()
                )));
            }
            if proportions.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(FireSpreadError::InvalidConfig(format!(
                    "biome {biome} has a negative or non-finite proportion"
                )));
            }
            if proportions.iter().sum::<f64>() <= 0.0 {
                return Err(FireSpreadError::InvalidConfig(format!(
                    "biome {biome} proportions sum to zero"
                )));
            }
        }

        if self.activation.len() != n_landcovers || self.release.len() != n_landcovers {
            return Err(FireSpreadError::InvalidConfig(format!(
                "{n_landcovers} landcover classes but {} activation and {} release distributions",
                self.activation.len(),
                self.release.len()
            )));
        }
        for distribution in self.activation.iter().chain(&self.release) {
            distribution.validate()?;
        }
        Ok(())
    }

    /// Build the default sampler for this configuration
    ///
    /// # Errors
    ///
    /// [`FireSpreadError::InvalidConfig`] if validation fails.
    pub fn sampler(&self) -> Result<DistributionSampler> {
        self.validate()?;
        DistributionSampler::new(
            &self.landcover_proportions,
            self.activation.clone(),
            self.release.clone(),
            self.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        let uniform = LandscapeConfig::uniform(
            EnergyDistribution::Constant { value: 0.0 },
            EnergyDistribution::Constant { value: 1.0 },
        );
        assert!(uniform.validate().is_ok());
        assert_eq!(uniform.n_biomes(), 1);
        assert_eq!(uniform.n_landcovers(), 2);

        let wui = LandscapeConfig::wildland_urban_interface();
        assert!(wui.validate().is_ok());
        assert_eq!(wui.n_biomes(), 2);
        assert_eq!(wui.n_landcovers(), 3);
        assert_eq!(wui.backend, PropagationBackend::Sequential);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = LandscapeConfig::wildland_urban_interface();
        config.landcover_proportions[1] = vec![0.5, 0.5];
        assert!(config.validate().is_err());

        let mut config = LandscapeConfig::wildland_urban_interface();
        config.landcover_proportions[0] = vec![0.0, 0.0, 0.0];
        assert!(config.validate().is_err());

        let mut config = LandscapeConfig::wildland_urban_interface();
        config.landcover_proportions[0][2] = -0.1;
        assert!(config.validate().is_err());

        let mut config = LandscapeConfig::wildland_urban_interface();
        config.release.pop();
        assert!(config.validate().is_err());

        let mut config = LandscapeConfig::wildland_urban_interface();
        config.landcover_proportions.clear();
        assert!(matches!(
            config.validate(),
            Err(FireSpreadError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = LandscapeConfig::wildland_urban_interface()
            .with_seed(11)
            .with_backend(PropagationBackend::Parallel);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.backend, PropagationBackend::Parallel);
        let sampler = config.sampler().unwrap();
        assert_eq!(sampler.n_biomes(), 2);
        assert_eq!(sampler.n_landcovers(), 3);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "landcover_proportions": [[0.0, 1.0]],
            "activation": [
                {"kind": "constant", "value": 0.0},
                {"kind": "constant", "value": 0.5}
            ],
            "release": [
                {"kind": "constant", "value": 0.0},
                {"kind": "normal", "mean": 1.0, "std_dev": 0.1}
            ]
        }"#;
        let config: LandscapeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.backend, PropagationBackend::Sequential);
        assert!(config.validate().is_ok());

        let json = r#"{
            "landcover_proportions": [[1.0]],
            "activation": [{"kind": "constant", "value": 0.0}],
            "release": [{"kind": "constant", "value": 0.0}],
            "seed": 3,
            "backend": "parallel"
        }"#;
        let config: LandscapeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.backend, PropagationBackend::Parallel);
    }
}
