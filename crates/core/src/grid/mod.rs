//! Landscape grids and environmental field sampling
//!
//! - [`field`]: the row-major [`Grid`] container and [`Pixel`] coordinates
//! - [`sampling`]: biome → landcover sampling and per-landcover energy
//!   distributions behind the [`FieldSampler`] trait

pub mod field;
pub mod sampling;

pub use field::{Grid, Pixel};
pub use sampling::{DistributionSampler, EnergyDistribution, FieldSampler};

/// Landcover class id. `0` is bare ground.
pub type Landcover = u8;

/// Biome class id
pub type Biome = u8;

/// Burn generation stamp. `0` means never ignited.
pub type Generation = u32;

/// Landcover class that can never burn
pub const INFLAMMABLE: Landcover = 0;

/// Generation stamp of a pixel that has not ignited
pub const UNBURNED: Generation = 0;
