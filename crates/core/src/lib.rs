//! Fire Spread Core Library
//!
//! A cellular wildfire spread engine. Burning pixels release energy to their
//! neighbours through a normalized inverse-square kernel; a pixel ignites
//! once its accumulated energy strictly exceeds its activation energy and
//! then becomes a source itself. The fire advances generation by generation
//! until no pixel is left burning.
//!
//! ## Modules
//!
//! - [`grid`]: field containers and landcover/energy sampling
//! - [`solver`]: energy kernel, active fire list, propagation and ignition
//! - [`simulation`]: the [`Landscape`] state machine and its configuration
//!
//! ## Example
//!
//! ```
//! use fire_spread_core::{EnergyDistribution, Grid, Landscape, LandscapeConfig, Pixel};
//!
//! let config = LandscapeConfig::uniform(
//!     EnergyDistribution::Constant { value: 0.0 },
//!     EnergyDistribution::Constant { value: 1.0 },
//! )
//! .with_seed(1);
//! let mut landscape = Landscape::from_config(Grid::new(5, 5), &config)?;
//! let stats = landscape.run(&[Pixel::new(2, 2)])?;
//! assert_eq!(stats.burned, 25);
//! # Ok::<(), fire_spread_core::FireSpreadError>(())
//! ```

pub mod error;
pub mod grid;
pub mod simulation;
pub mod solver;

pub use error::{FireSpreadError, Result};

pub use grid::{
    Biome, DistributionSampler, EnergyDistribution, FieldSampler, Generation, Grid, Landcover,
    Pixel, INFLAMMABLE, UNBURNED,
};

pub use simulation::{Landscape, LandscapeConfig, LandscapeState, LandscapeStats};

pub use solver::{
    ActiveFireList, BurnBudget, BurnFields, EnergyKernel, PropagationBackend, KERNEL_RADIUS,
};
