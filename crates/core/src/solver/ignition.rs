//! Ignition of initial fires and ignition point placement

use super::active_list::ActiveFireList;
use crate::error::{FireSpreadError, Result};
use crate::grid::{Generation, Grid, Landcover, Pixel, INFLAMMABLE, UNBURNED};
use tracing::debug;

/// Stamp given to pixels ignited directly by a caller
pub const FIRST_GENERATION: Generation = 1;

/// Inject ignition points into the active list.
///
/// Coordinates on inflammable pixels, or on pixels that are already burning
/// or burned, are skipped silently. Accepted pixels are enqueued and stamped
/// with [`FIRST_GENERATION`]. Bounds are the caller's responsibility.
///
/// # Returns
///
/// The number of pixels actually ignited.
///
/// # Errors
///
/// [`FireSpreadError::CapacityExhausted`] if the list invariant is broken.
pub fn ignite(
    coordinates: &[Pixel],
    list: &mut ActiveFireList,
    landcover: &Grid<Landcover>,
    generation: &mut Grid<Generation>,
) -> Result<usize> {
    let mut n_added = 0;
    for &pixel in coordinates {
        if landcover[pixel] == INFLAMMABLE || generation[pixel] != UNBURNED {
            continue;
        }
        list.enqueue(pixel)?;
        generation[pixel] = FIRST_GENERATION;
        n_added += 1;
    }
    debug!(
        "Ignited {} of {} requested pixels",
        n_added,
        coordinates.len()
    );
    Ok(n_added)
}

/// Clamped half-open window `[center - buffer, center + buffer + 1)`
fn window(center: usize, buffer: usize, size: usize) -> (usize, usize) {
    (
        center.saturating_sub(buffer).min(size),
        center.saturating_add(buffer + 1).min(size),
    )
}

/// Choose the `n` flammable pixels closest to `point`.
///
/// Searches a square window around `point` that starts at half-size
/// `2·⌊√n⌋ + 1` and doubles until it holds at least `n` flammable pixels or
/// covers the whole map. The result is ordered nearest first, ties broken
/// row-major.
///
/// # Errors
///
/// [`FireSpreadError::InsufficientFlammableArea`] if the map has fewer than
/// `n` flammable pixels.
pub fn find_closest_flammable_cells(
    landcover: &Grid<Landcover>,
    n: usize,
    point: Pixel,
) -> Result<Vec<Pixel>> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let (height, width) = landcover.shape();
    let mut buffer = 2 * (n as f64).sqrt() as usize + 1;

    let found = loop {
        let (y0, y1) = window(point.y, buffer, height);
        let (x0, x1) = window(point.x, buffer, width);

        let mut found = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                let pixel = Pixel::new(y, x);
                if landcover[pixel] != INFLAMMABLE {
                    found.push(pixel);
                }
            }
        }

        let covers_map = y0 == 0 && x0 == 0 && y1 == height && x1 == width;
        if found.len() >= n || covers_map {
            break found;
        }
        buffer *= 2;
    };

    if found.len() < n {
        return Err(FireSpreadError::InsufficientFlammableArea {
            requested: n,
            found: found.len(),
        });
    }

    let distance_squared = |p: &Pixel| {
        let dy = p.y.abs_diff(point.y);
        let dx = p.x.abs_diff(point.x);
        dy * dy + dx * dx
    };

    let mut closest = found;
    // Stable sort keeps row-major order among equidistant pixels
    closest.sort_by_key(distance_squared);
    closest.truncate(n);
    Ok(closest)
}

/// Flammable pixels marked `true` in a fire mask, row-major.
///
/// # Errors
///
/// [`FireSpreadError::ShapeMismatch`] if the mask and landcover differ in shape.
pub fn ignition_points_from_mask(
    mask: &Grid<bool>,
    landcover: &Grid<Landcover>,
) -> Result<Vec<Pixel>> {
    landcover.check_shape(mask)?;
    Ok(mask
        .iter_pixels()
        .filter(|&(pixel, burning)| burning && landcover[pixel] != INFLAMMABLE)
        .map(|(pixel, _)| pixel)
        .collect())
}
