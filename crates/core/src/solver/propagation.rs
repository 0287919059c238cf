//! Generation-stepping fire propagation
//!
//! Stateless burn routines operating on fields lent by the owner of a
//! landscape ([`BurnFields`]) plus an [`ActiveFireList`]:
//!
//! - [`burn_next_active_pixel`]: distribute the head pixel's energy
//! - [`burn_next_iteration`]: burn one whole generation (wavefront layer)
//! - [`burn_next_iteration_parallel`]: same result, contributions computed with Rayon
//! - [`burn_all`]: burn pixel by pixel until extinct or out of budget
//!
//! A neighbour ignites when its accumulated energy strictly exceeds its
//! activation energy. It is stamped with the source's generation plus one
//! and appended to the list. Pixels that are out of bounds, inflammable or
//! already stamped are skipped, never reported as errors.

use super::active_list::ActiveFireList;
use super::kernel::{kernel, KERNEL_RADIUS};
use crate::error::{FireSpreadError, Result};
use crate::grid::{Generation, Grid, Landcover, Pixel, INFLAMMABLE, UNBURNED};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, trace};

/// Fields borrowed from a landscape for the duration of one burn call
///
/// Static fields are shared borrows, the two fields written by propagation
/// are exclusive borrows. All five grids must share one shape.
#[derive(Debug)]
pub struct BurnFields<'a> {
    /// Landcover class per pixel (`0` = inflammable)
    pub landcover: &'a Grid<Landcover>,
    /// Activation energy per pixel
    pub activation: &'a Grid<f64>,
    /// Released energy per pixel
    pub release: &'a Grid<f64>,
    /// Accumulated energy per pixel
    pub energy: &'a mut Grid<f64>,
    /// Burn generation stamp per pixel (`0` = never ignited)
    pub generation: &'a mut Grid<Generation>,
}

/// Pixel budget for [`burn_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurnBudget {
    /// Burn until the active list is empty
    Unlimited,
    /// Burn at most this many pixels
    Pixels(usize),
}

impl From<i64> for BurnBudget {
    /// Negative budgets (conventionally `-1`) mean unlimited
    fn from(n: i64) -> Self {
        usize::try_from(n).map_or(BurnBudget::Unlimited, BurnBudget::Pixels)
    }
}

impl BurnBudget {
    /// True when no more pixels may be burned
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, BurnBudget::Pixels(0))
    }
}

/// Row and column ranges of the kernel's bounding square, clipped to the grid
fn neighbourhood(center: Pixel, height: usize, width: usize) -> (Range<usize>, Range<usize>) {
    let rows = center.y.saturating_sub(KERNEL_RADIUS)..(center.y + KERNEL_RADIUS + 1).min(height);
    let cols = center.x.saturating_sub(KERNEL_RADIUS)..(center.x + KERNEL_RADIUS + 1).min(width);
    (rows, cols)
}

#[inline]
fn signed_offset(from: usize, to: usize) -> isize {
    to as isize - from as isize
}

/// Burn the pixel at the head of the active list.
///
/// Every flammable, never-ignited pixel within the kernel radius receives
/// `R[source] · w(d) / K`, visited row-major. Pixels pushed over their
/// activation energy are stamped `F[source] + 1` and enqueued; the first
/// source to push a pixel over wins the stamp.
///
/// # Returns
///
/// `true` if pixels remain pending after this one.
///
/// # Errors
///
/// [`FireSpreadError::EmptyActiveList`] if nothing is pending, and
/// [`FireSpreadError::CapacityExhausted`] if the list invariant is broken.
pub fn burn_next_active_pixel(
    list: &mut ActiveFireList,
    fields: &mut BurnFields<'_>,
) -> Result<bool> {
    let source = list.current().ok_or(FireSpreadError::EmptyActiveList)?;
    let fire_generation = fields.generation[source];
    let release = fields.release[source];
    let kernel = kernel();
    let (height, width) = fields.landcover.shape();
    let (rows, cols) = neighbourhood(source, height, width);

    for iy in rows {
        for ix in cols.clone() {
            let neighbour = Pixel::new(iy, ix);
            if neighbour == source
                || fields.landcover[neighbour] == INFLAMMABLE
                || fields.generation[neighbour] != UNBURNED
            {
                continue;
            }

            let Some(delta) = kernel.transfer(
                release,
                signed_offset(source.y, iy),
                signed_offset(source.x, ix),
            ) else {
                continue;
            };

            let energy = fields.energy[neighbour] + delta;
            fields.energy[neighbour] = energy;

            if energy > fields.activation[neighbour] {
                list.enqueue(neighbour)?;
                fields.generation[neighbour] = fire_generation + 1;
                trace!(
                    "Pixel ({}, {}) ignited by ({}, {}) in generation {}",
                    iy,
                    ix,
                    source.y,
                    source.x,
                    fire_generation + 1
                );
            }
        }
    }

    list.advance()?;
    Ok(!list.is_empty())
}

/// Burn every consecutive head pixel sharing the head's generation stamp.
///
/// A head stamped `0` means the list is positioned on an unlit pixel; that
/// is treated as "no more work" and nothing is burned.
///
/// # Returns
///
/// `true` if pixels remain pending afterwards.
///
/// # Errors
///
/// Propagates errors from [`burn_next_active_pixel`].
pub fn burn_next_iteration(list: &mut ActiveFireList, fields: &mut BurnFields<'_>) -> Result<bool> {
    let Some(head) = list.current() else {
        return Ok(false);
    };
    let iteration = fields.generation[head];
    if iteration == UNBURNED {
        return Ok(false);
    }

    let before = list.start();
    while let Some(pixel) = list.current() {
        if fields.generation[pixel] != iteration {
            break;
        }
        burn_next_active_pixel(list, fields)?;
    }

    debug!(
        "Burned generation {}: {} pixels, {} pending",
        iteration,
        list.start() - before,
        list.len()
    );
    Ok(!list.is_empty())
}

/// Candidate energy contributions of one source against a snapshot of the
/// stamps, in the same row-major order the sequential step visits them.
fn candidate_contributions(
    source: Pixel,
    landcover: &Grid<Landcover>,
    release: &Grid<f64>,
    generation: &Grid<Generation>,
) -> Vec<(Pixel, f64)> {
    let kernel = kernel();
    let source_release = release[source];
    let (height, width) = landcover.shape();
    let (rows, cols) = neighbourhood(source, height, width);

    let mut out = Vec::new();
    for iy in rows {
        for ix in cols.clone() {
            let neighbour = Pixel::new(iy, ix);
            if neighbour == source
                || landcover[neighbour] == INFLAMMABLE
                || generation[neighbour] != UNBURNED
            {
                continue;
            }
            if let Some(delta) = kernel.transfer(
                source_release,
                signed_offset(source.y, iy),
                signed_offset(source.x, ix),
            ) {
                out.push((neighbour, delta));
            }
        }
    }
    out
}

/// Parallel variant of [`burn_next_iteration`].
///
/// The read-only part of the work (which neighbours each source of the
/// generation reaches, and with how much energy) is computed with Rayon.
/// Contributions are then applied in source order with a first-claim check
/// on the generation stamp, which reproduces the sequential floating point
/// accumulation order and ignition assignment exactly.
///
/// # Errors
///
/// [`FireSpreadError::CapacityExhausted`] if the list invariant is broken.
pub fn burn_next_iteration_parallel(
    list: &mut ActiveFireList,
    fields: &mut BurnFields<'_>,
) -> Result<bool> {
    let Some(head) = list.current() else {
        return Ok(false);
    };
    let iteration = fields.generation[head];
    if iteration == UNBURNED {
        return Ok(false);
    }

    let sources: Vec<Pixel> = list
        .pending()
        .take_while(|&p| fields.generation[p] == iteration)
        .collect();

    let contributions: Vec<Vec<(Pixel, f64)>> = {
        let landcover = fields.landcover;
        let release = fields.release;
        let generation: &Grid<Generation> = &*fields.generation;
        sources
            .par_iter()
            .map(|&source| candidate_contributions(source, landcover, release, generation))
            .collect()
    };

    for candidates in contributions {
        for (neighbour, delta) in candidates {
            // Claimed by an earlier source of this generation
            if fields.generation[neighbour] != UNBURNED {
                continue;
            }
            let energy = fields.energy[neighbour] + delta;
            fields.energy[neighbour] = energy;
            if energy > fields.activation[neighbour] {
                list.enqueue(neighbour)?;
                fields.generation[neighbour] = iteration + 1;
            }
        }
        list.advance()?;
    }

    debug!(
        "Burned generation {} in parallel: {} pixels, {} pending",
        iteration,
        sources.len(),
        list.len()
    );
    Ok(!list.is_empty())
}

/// Burn pixel by pixel until the list empties or `budget` runs out.
///
/// # Returns
///
/// The unused part of the budget.
///
/// # Errors
///
/// Propagates errors from [`burn_next_active_pixel`].
pub fn burn_all(
    list: &mut ActiveFireList,
    fields: &mut BurnFields<'_>,
    budget: BurnBudget,
) -> Result<BurnBudget> {
    let mut remaining = budget;
    while !list.is_empty() && !remaining.is_exhausted() {
        burn_next_active_pixel(list, fields)?;
        if let BurnBudget::Pixels(n) = remaining {
            remaining = BurnBudget::Pixels(n - 1);
        }
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct TestFields {
        landcover: Grid<Landcover>,
        activation: Grid<f64>,
        release: Grid<f64>,
        energy: Grid<f64>,
        generation: Grid<Generation>,
    }

    impl TestFields {
        fn uniform(height: usize, width: usize, activation: f64, release: f64) -> Self {
            Self {
                landcover: Grid::with_value(height, width, 1),
                activation: Grid::with_value(height, width, activation),
                release: Grid::with_value(height, width, release),
                energy: Grid::new(height, width),
                generation: Grid::new(height, width),
            }
        }

        fn fields(&mut self) -> BurnFields<'_> {
            BurnFields {
                landcover: &self.landcover,
                activation: &self.activation,
                release: &self.release,
                energy: &mut self.energy,
                generation: &mut self.generation,
            }
        }

        fn light(&mut self, list: &mut ActiveFireList, pixel: Pixel) {
            list.enqueue(pixel).unwrap();
            self.generation[pixel] = 1;
        }
    }

    #[test]
    fn test_single_pixel_distributes_energy() {
        let mut t = TestFields::uniform(3, 3, 1000.0, 1.0);
        let mut list = ActiveFireList::with_shape(3, 3);
        t.light(&mut list, Pixel::new(1, 1));

        let more = burn_next_active_pixel(&mut list, &mut t.fields()).unwrap();
        assert!(!more);

        let k = kernel().denominator();
        assert_relative_eq!(t.energy[(1, 0)], 1.0 / k);
        assert_relative_eq!(t.energy[(0, 0)], 0.5 / k, epsilon = 1e-15);
        assert_eq!(t.energy[(1, 1)], 0.0);
        assert_eq!(t.generation.count(|g| g != 0), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut t = TestFields::uniform(3, 3, 1000.0, 1.0);
        let delta = kernel().transfer(1.0, 0, 1).unwrap();
        t.activation[(1, 2)] = delta;
        t.activation[(1, 0)] = 0.0;

        let mut list = ActiveFireList::with_shape(3, 3);
        t.light(&mut list, Pixel::new(1, 1));
        let more = burn_next_active_pixel(&mut list, &mut t.fields()).unwrap();

        assert!(more);
        assert_eq!(t.generation[(1, 2)], 0);
        assert_eq!(t.generation[(1, 0)], 2);
        assert_eq!(list.current(), Some(Pixel::new(1, 0)));
    }

    #[test]
    fn test_inflammable_pixels_untouched() {
        let mut t = TestFields::uniform(3, 3, 0.0, 1.0);
        t.landcover[(0, 1)] = INFLAMMABLE;
        t.energy[(0, 1)] = f64::NAN;

        let mut list = ActiveFireList::with_shape(3, 3);
        t.light(&mut list, Pixel::new(1, 1));
        burn_next_active_pixel(&mut list, &mut t.fields()).unwrap();

        assert!(t.energy[(0, 1)].is_nan());
        assert_eq!(t.generation[(0, 1)], 0);
        assert_eq!(t.generation.count(|g| g == 2), 7);
    }

    #[test]
    fn test_burned_pixels_receive_no_energy() {
        let mut t = TestFields::uniform(1, 3, 1000.0, 1.0);
        let mut list = ActiveFireList::with_shape(1, 3);
        t.light(&mut list, Pixel::new(0, 0));
        t.light(&mut list, Pixel::new(0, 1));

        burn_next_active_pixel(&mut list, &mut t.fields()).unwrap();
        assert_eq!(t.energy[(0, 1)], 0.0);
        assert!(t.energy[(0, 2)] > 0.0);
    }

    #[test]
    fn test_empty_list() {
        let mut t = TestFields::uniform(2, 2, 0.0, 1.0);
        let mut list = ActiveFireList::with_shape(2, 2);
        assert_eq!(
            burn_next_active_pixel(&mut list, &mut t.fields()),
            Err(FireSpreadError::EmptyActiveList)
        );
        assert_eq!(burn_next_iteration(&mut list, &mut t.fields()), Ok(false));
        assert_eq!(
            burn_next_iteration_parallel(&mut list, &mut t.fields()),
            Ok(false)
        );
    }

    #[test]
    fn test_iteration_on_unlit_head_is_noop() {
        let mut t = TestFields::uniform(2, 2, 0.0, 1.0);
        let mut list = ActiveFireList::with_shape(2, 2);
        list.enqueue(Pixel::new(0, 0)).unwrap();

        assert_eq!(burn_next_iteration(&mut list, &mut t.fields()), Ok(false));
        assert_eq!(list.start(), 0);
        assert_eq!(list.end(), 1);
        assert!(t.energy.as_slice().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn test_iteration_burns_one_generation() {
        let mut t = TestFields::uniform(1, 30, 0.0, 1.0);
        let mut list = ActiveFireList::with_shape(1, 30);
        t.light(&mut list, Pixel::new(0, 0));

        assert!(burn_next_iteration(&mut list, &mut t.fields()).unwrap());
        assert_eq!(list.start(), 1);
        assert_eq!(list.len(), KERNEL_RADIUS);
        for x in 1..=KERNEL_RADIUS {
            assert_eq!(t.generation[(0, x)], 2);
        }
        assert_eq!(t.generation[(0, 11)], 0);

        assert!(burn_next_iteration(&mut list, &mut t.fields()).unwrap());
        assert_eq!(list.start(), 11);
        assert_eq!(t.generation[(0, 11)], 3);
        assert_eq!(t.generation[(0, 20)], 3);
        assert_eq!(t.generation[(0, 21)], 0);
    }

    #[test]
    fn test_burn_budget_from_signed() {
        assert_eq!(BurnBudget::from(-1), BurnBudget::Unlimited);
        assert_eq!(BurnBudget::from(-7), BurnBudget::Unlimited);
        assert_eq!(BurnBudget::from(0), BurnBudget::Pixels(0));
        assert_eq!(BurnBudget::from(3), BurnBudget::Pixels(3));
        assert!(BurnBudget::Pixels(0).is_exhausted());
        assert!(!BurnBudget::Unlimited.is_exhausted());
    }

    #[test]
    fn test_burn_all_respects_budget() {
        let mut t = TestFields::uniform(1, 12, 0.0, 1.0);
        let mut list = ActiveFireList::with_shape(1, 12);
        t.light(&mut list, Pixel::new(0, 0));

        let remaining = burn_all(&mut list, &mut t.fields(), BurnBudget::Pixels(3)).unwrap();
        assert_eq!(remaining, BurnBudget::Pixels(0));
        assert_eq!(list.start(), 3);

        let remaining = burn_all(&mut list, &mut t.fields(), BurnBudget::Unlimited).unwrap();
        assert_eq!(remaining, BurnBudget::Unlimited);
        assert!(list.is_empty());
        assert_eq!(list.end(), 12);

        let remaining = burn_all(&mut list, &mut t.fields(), BurnBudget::Pixels(5)).unwrap();
        assert_eq!(remaining, BurnBudget::Pixels(5));
    }

    fn random_fields(seed: u64, height: usize, width: usize) -> TestFields {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = TestFields::uniform(height, width, 0.0, 1.0);
        for idx in 0..height * width {
            let bare = rng.random::<f64>() < 0.15;
            t.landcover.as_mut_slice()[idx] = if bare { INFLAMMABLE } else { 1 };
            t.energy.as_mut_slice()[idx] = if bare { f64::NAN } else { 0.0 };
            t.activation.as_mut_slice()[idx] = rng.random_range(0.0..0.12);
            t.release.as_mut_slice()[idx] = rng.random_range(0.5..1.5);
        }
        t
    }

    #[test]
    fn test_parallel_iteration_matches_sequential() {
        let (height, width) = (40, 40);
        let mut sequential = random_fields(7, height, width);
        let mut parallel = random_fields(7, height, width);
        let mut seq_list = ActiveFireList::with_shape(height, width);
        let mut par_list = ActiveFireList::with_shape(height, width);

        for pixel in [Pixel::new(20, 20), Pixel::new(3, 35)] {
            if sequential.landcover[pixel] != INFLAMMABLE {
                sequential.light(&mut seq_list, pixel);
                parallel.light(&mut par_list, pixel);
            }
        }

        loop {
            let seq_more = burn_next_iteration(&mut seq_list, &mut sequential.fields()).unwrap();
            let par_more =
                burn_next_iteration_parallel(&mut par_list, &mut parallel.fields()).unwrap();
            assert_eq!(seq_more, par_more);
            assert_eq!(seq_list, par_list);
            if !seq_more {
                break;
            }
        }

        assert_eq!(sequential.generation, parallel.generation);
        let bits = |grid: &Grid<f64>| -> Vec<u64> {
            grid.as_slice().iter().copied().map(f64::to_bits).collect()
        };
        assert_eq!(bits(&sequential.energy), bits(&parallel.energy));
    }
}
