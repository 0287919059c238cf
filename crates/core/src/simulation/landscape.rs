//! Landscape: field ownership and the run state machine
//!
//! A [`Landscape`] owns the biome map, every sampled and dynamic field, and
//! the active fire list. Engine calls receive short-lived borrows of those
//! fields through [`BurnFields`], one call at a time.
//!
//! ```text
//! Configured --reset--> Reset --ignite--> Active --iterate*--> Extinguished
//!      ^                                                            |
//!      +------------------------- reset ----------------------------+
//! ```

use super::config::LandscapeConfig;
use crate::error::Result;
use crate::grid::{
    Biome, FieldSampler, Generation, Grid, Landcover, Pixel, INFLAMMABLE, UNBURNED,
};
use crate::solver::{
    burn_all, burn_next_active_pixel, find_closest_flammable_cells, ignite,
    ignition_points_from_mask, ActiveFireList, BurnBudget, BurnFields, PropagationBackend,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Iterations between progress reports in [`Landscape::run`]
const PROGRESS_INTERVAL: usize = 100;

/// Lifecycle state of a landscape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LandscapeState {
    /// Constructed, fields not yet sampled
    Configured,
    /// Fields sampled, nothing burning
    Reset,
    /// At least one pixel pending in the active list
    Active,
    /// The active list emptied after burning
    Extinguished,
}

/// Summary of a landscape's burn state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandscapeStats {
    /// Pixels with a non-zero generation stamp
    pub burned: usize,
    /// Pixels ignited but not yet burned out
    pub pending: usize,
    /// Highest generation stamp reached
    pub generations: Generation,
    /// Generation steps taken since the last reset
    pub iterations: usize,
    /// Pixels with bare landcover
    pub inflammable: usize,
    /// Energy cells holding `NaN`
    pub unassigned_energy: usize,
    /// Burned pixel count per landcover class
    pub burned_by_landcover: FxHashMap<Landcover, usize>,
}

impl LandscapeStats {
    /// Share of flammable pixels that burned, `0.0` when nothing is flammable
    #[must_use]
    pub fn burned_fraction(&self, total_pixels: usize) -> f64 {
        let flammable = total_pixels.saturating_sub(self.inflammable);
        if flammable == 0 {
            0.0
        } else {
            self.burned as f64 / flammable as f64
        }
    }
}

/// A single wildfire landscape
pub struct Landscape {
    biomes: Grid<Biome>,
    landcover: Grid<Landcover>,
    activation: Grid<f64>,
    release: Grid<f64>,
    energy: Grid<f64>,
    generation: Grid<Generation>,
    fires: ActiveFireList,

    /// Source of `landcover`, `activation` and `release` on reset
    sampler: Box<dyn FieldSampler>,
    backend: PropagationBackend,

    iterations: usize,
    state: LandscapeState,
}

impl Landscape {
    /// Create a landscape over a biome map.
    ///
    /// All fields start zeroed and the landscape is [`LandscapeState::Configured`];
    /// call [`reset`](Self::reset) to sample fields before igniting.
    pub fn new(biomes: Grid<Biome>, sampler: impl FieldSampler + 'static) -> Self {
        let (height, width) = biomes.shape();
        info!("Creating landscape: {}x{} pixels", height, width);

        Self {
            landcover: Grid::new(height, width),
            activation: Grid::new(height, width),
            release: Grid::new(height, width),
            energy: Grid::new(height, width),
            generation: Grid::new(height, width),
            fires: ActiveFireList::with_shape(height, width),
            biomes,
            sampler: Box::new(sampler),
            backend: PropagationBackend::default(),
            iterations: 0,
            state: LandscapeState::Configured,
        }
    }

    /// Create a landscape whose fields are sampled from `config`.
    ///
    /// # Errors
    ///
    /// [`FireSpreadError::InvalidConfig`](crate::FireSpreadError::InvalidConfig)
    /// if the configuration does not validate.
    pub fn from_config(biomes: Grid<Biome>, config: &LandscapeConfig) -> Result<Self> {
        let sampler = config.sampler()?;
        info!(
            "Landscape configured with {} biomes, {} landcover classes, {:?} backend",
            config.n_biomes(),
            config.n_landcovers(),
            config.backend
        );
        Ok(Self::new(biomes, sampler).with_backend(config.backend))
    }

    /// Use another propagation backend for generation steps
    #[must_use]
    pub fn with_backend(mut self, backend: PropagationBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Switch propagation backend
    pub fn set_backend(&mut self, backend: PropagationBackend) {
        self.backend = backend;
    }

    /// Re-sample the static fields and clear all burn state.
    ///
    /// Energy starts at zero, or `NaN` on inflammable pixels.
    ///
    /// # Errors
    ///
    /// Propagates sampler failures. On error the landscape is left
    /// [`LandscapeState::Configured`] with bare landcover and unassigned
    /// energy, and refuses ignition until a reset succeeds.
    pub fn reset(&mut self) -> Result<()> {
        self.state = LandscapeState::Configured;
        self.fires.clear();
        self.generation.fill(UNBURNED);
        self.landcover.fill(INFLAMMABLE);
        self.energy.fill(f64::NAN);
        self.iterations = 0;

        let sampler = &mut self.sampler;
        sampler.sample_landcover(&self.biomes, &mut self.landcover)?;
        sampler.sample_activation(&self.landcover, &mut self.activation)?;
        sampler.sample_release(&self.landcover, &mut self.release)?;

        for (energy, &landcover) in self
            .energy
            .as_mut_slice()
            .iter_mut()
            .zip(self.landcover.as_slice())
        {
            *energy = if landcover == INFLAMMABLE { f64::NAN } else { 0.0 };
        }

        self.state = LandscapeState::Reset;
        info!(
            "Landscape reset: {} of {} pixels inflammable",
            self.landcover.count(|l| l == INFLAMMABLE),
            self.landcover.len()
        );
        Ok(())
    }

    /// Ignite a set of pixels.
    ///
    /// Every coordinate is bounds-checked before anything changes. Pixels on
    /// bare ground or already ignited are skipped. A landscape whose fields
    /// have not been sampled ([`LandscapeState::Configured`]) ignites nothing.
    ///
    /// # Returns
    ///
    /// The number of pixels actually ignited.
    ///
    /// # Errors
    ///
    /// [`FireSpreadError::InvalidCoordinate`](crate::FireSpreadError::InvalidCoordinate)
    /// for the first coordinate outside the grid.
    pub fn ignite(&mut self, coordinates: &[Pixel]) -> Result<usize> {
        if let Some(err) = coordinates
            .iter()
            .find_map(|&p| self.landcover.check_bounds(p).err())
        {
            warn!("Rejected ignition request: {}", err);
            return Err(err);
        }
        if self.state == LandscapeState::Configured {
            warn!("Ignoring ignition of {} pixels before reset", coordinates.len());
            return Ok(0);
        }

        let n_added = ignite(
            coordinates,
            &mut self.fires,
            &self.landcover,
            &mut self.generation,
        )?;
        if !self.fires.is_empty() {
            self.state = LandscapeState::Active;
        }
        Ok(n_added)
    }

    /// Ignite the `n` flammable pixels closest to `point`.
    ///
    /// # Errors
    ///
    /// `InvalidCoordinate` if `point` is outside the grid,
    /// `InsufficientFlammableArea` if fewer than `n` pixels can burn.
    pub fn ignite_near(&mut self, point: Pixel, n: usize) -> Result<usize> {
        self.landcover.check_bounds(point)?;
        let cells = find_closest_flammable_cells(&self.landcover, n, point)?;
        self.ignite(&cells)
    }

    /// Ignite every flammable pixel marked in `mask`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the mask shape differs from the landscape.
    pub fn ignite_mask(&mut self, mask: &Grid<bool>) -> Result<usize> {
        let points = ignition_points_from_mask(mask, &self.landcover)?;
        self.ignite(&points)
    }

    /// Split borrows of the list and the engine's field bundle
    fn burn_parts(&mut self) -> (&mut ActiveFireList, BurnFields<'_>) {
        (
            &mut self.fires,
            BurnFields {
                landcover: &self.landcover,
                activation: &self.activation,
                release: &self.release,
                energy: &mut self.energy,
                generation: &mut self.generation,
            },
        )
    }

    fn update_state(&mut self) {
        if self.fires.is_empty() && self.state == LandscapeState::Active {
            self.state = LandscapeState::Extinguished;
            info!(
                "Fire extinguished after {} iterations, {} pixels burned",
                self.iterations,
                self.fires.end()
            );
        }
    }

    /// Burn the pixel at the head of the active list.
    ///
    /// # Errors
    ///
    /// `EmptyActiveList` if nothing is burning.
    pub fn burn_next_pixel(&mut self) -> Result<bool> {
        let (fires, mut fields) = self.burn_parts();
        let more = burn_next_active_pixel(fires, &mut fields)?;
        self.update_state();
        Ok(more)
    }

    /// Burn pixel by pixel within a budget.
    ///
    /// # Returns
    ///
    /// The unused part of the budget.
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub fn burn(&mut self, budget: impl Into<BurnBudget>) -> Result<BurnBudget> {
        let budget = budget.into();
        let (fires, mut fields) = self.burn_parts();
        let remaining = burn_all(fires, &mut fields, budget)?;
        self.update_state();
        Ok(remaining)
    }

    /// Burn one generation with the configured backend.
    ///
    /// Does nothing and returns `false` when no pixel is pending; the
    /// iteration counter only counts steps that had work.
    ///
    /// # Errors
    ///
    /// Propagates engine errors.
    pub fn iterate(&mut self) -> Result<bool> {
        if self.fires.is_empty() {
            return Ok(false);
        }
        self.iterations += 1;

        let backend = self.backend;
        let (fires, mut fields) = self.burn_parts();
        let more = backend.burn_generation(fires, &mut fields)?;
        debug!(
            "Iteration {}: {} pixels pending",
            self.iterations,
            self.fires.len()
        );
        self.update_state();
        Ok(more)
    }

    /// Reset, ignite `coordinates` and iterate until the fire dies out.
    ///
    /// # Errors
    ///
    /// Propagates reset, ignition and engine errors.
    pub fn run(&mut self, coordinates: &[Pixel]) -> Result<LandscapeStats> {
        self.reset()?;
        let n_ignited = self.ignite(coordinates)?;
        info!("Starting run with {} ignition points", n_ignited);

        let mut next_report = PROGRESS_INTERVAL;
        while self.iterate()? {
            if self.iterations >= next_report {
                info!(
                    "Iteration {}: {} burned, {} pending",
                    self.iterations,
                    self.fires.end(),
                    self.fires.len()
                );
                next_report += PROGRESS_INTERVAL;
            }
        }

        let stats = self.stats();
        info!(
            "Run complete: {} pixels burned over {} generations in {} iterations",
            stats.burned, stats.generations, stats.iterations
        );
        Ok(stats)
    }

    /// Collect run statistics
    #[must_use]
    pub fn stats(&self) -> LandscapeStats {
        let mut burned_by_landcover = FxHashMap::default();
        let mut burned = 0;
        let mut generations = UNBURNED;
        for (&stamp, &landcover) in self
            .generation
            .as_slice()
            .iter()
            .zip(self.landcover.as_slice())
        {
            if stamp != UNBURNED {
                burned += 1;
                generations = generations.max(stamp);
                *burned_by_landcover.entry(landcover).or_insert(0) += 1;
            }
        }

        LandscapeStats {
            burned,
            pending: self.fires.len(),
            generations,
            iterations: self.iterations,
            inflammable: self.landcover.count(|l| l == INFLAMMABLE),
            unassigned_energy: self.energy.count(f64::is_nan),
            burned_by_landcover,
        }
    }

    /// Biome map
    pub fn biomes(&self) -> &Grid<Biome> {
        &self.biomes
    }

    /// Landcover field
    pub fn landcover(&self) -> &Grid<Landcover> {
        &self.landcover
    }

    /// Accumulated energy field
    pub fn energy(&self) -> &Grid<f64> {
        &self.energy
    }

    /// Activation energy field
    pub fn activation(&self) -> &Grid<f64> {
        &self.activation
    }

    /// Released energy field
    pub fn release(&self) -> &Grid<f64> {
        &self.release
    }

    /// Generation stamps
    pub fn generation(&self) -> &Grid<Generation> {
        &self.generation
    }

    /// Active fire list
    pub fn fires(&self) -> &ActiveFireList {
        &self.fires
    }

    /// Pixels currently pending
    pub fn active_fires(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.fires.pending()
    }

    /// Most recently ignited pixel
    pub fn last_ignited(&self) -> Option<Pixel> {
        self.fires
            .end()
            .checked_sub(1)
            .and_then(|i| self.fires.get(i))
    }

    /// Generation steps taken since the last reset
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Current lifecycle state
    pub fn state(&self) -> LandscapeState {
        self.state
    }

    /// Backend used by [`iterate`](Self::iterate)
    pub fn backend(&self) -> PropagationBackend {
        self.backend
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        self.biomes.shape()
    }
}
