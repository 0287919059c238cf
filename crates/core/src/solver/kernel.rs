//! Distance-weighted energy transfer kernel
//!
//! A burning pixel releases energy to every pixel within [`KERNEL_RADIUS`]
//! with an inverse-square falloff:
//!
//! ```text
//! w(d) = 1 / d²          for 0 < d <= KERNEL_RADIUS
//! K    = Σ w(d)           over all integer offsets of the truncated support
//! ΔE   = R[source] · w(d) / K
//! ```
//!
//! Dividing by `K` makes the kernel mass over its finite support sum to one,
//! so `R` is the total energy a pixel can inject into its neighbourhood
//! independent of the kernel's shape.
//!
//! The weight table and `K` are computed once, on first use, and shared by
//! every landscape in the process.

use crate::grid::Pixel;
use nalgebra::Vector2;
use std::sync::LazyLock;

/// Maximum distance (in pixels) over which energy is transferred
pub const KERNEL_RADIUS: usize = 10;

/// Side length of the square bounding the kernel support
const KERNEL_SIDE: usize = 2 * KERNEL_RADIUS + 1;

static KERNEL: LazyLock<EnergyKernel> = LazyLock::new(EnergyKernel::compute);

/// Shared, lazily computed kernel instance
#[must_use]
pub fn kernel() -> &'static EnergyKernel {
    &KERNEL
}

/// Euclidean distance between two pixels
#[must_use]
pub fn euclidean_distance(a: Pixel, b: Pixel) -> f64 {
    Vector2::new(a.y as f64 - b.y as f64, a.x as f64 - b.x as f64).norm()
}

/// Inverse-square weight for a distance
#[inline]
fn weight_distance(dist: f64) -> f64 {
    1.0 / (dist * dist)
}

/// Precomputed weight table and normalization constant
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyKernel {
    /// Row-major `KERNEL_SIDE²` table indexed by `(dy + R, dx + R)`.
    /// `None` at the origin and outside the radius.
    weights: Vec<Option<f64>>,
    denominator: f64,
}

impl EnergyKernel {
    /// Build the table and normalization constant.
    ///
    /// Offsets are visited row-major so the summation order (and therefore
    /// the floating point result) is fixed.
    #[must_use]
    pub fn compute() -> Self {
        let radius = KERNEL_RADIUS as f64;
        let mut weights = Vec::with_capacity(KERNEL_SIDE * KERNEL_SIDE);
        let mut denominator = 0.0;

        let origin = Pixel::new(KERNEL_RADIUS, KERNEL_RADIUS);
        for iy in 0..KERNEL_SIDE {
            for ix in 0..KERNEL_SIDE {
                let offset = Pixel::new(iy, ix);
                if offset == origin {
                    weights.push(None);
                    continue;
                }
                let dist = euclidean_distance(offset, origin);
                if dist > radius {
                    weights.push(None);
                    continue;
                }
                let w = weight_distance(dist);
                denominator += w;
                weights.push(Some(w));
            }
        }

        Self {
            weights,
            denominator,
        }
    }

    /// Truncation radius in pixels
    #[must_use]
    pub const fn radius(&self) -> usize {
        KERNEL_RADIUS
    }

    /// Normalization constant `K`
    #[must_use]
    pub fn denominator(&self) -> f64 {
        self.denominator
    }

    /// Unnormalized weight for offset `(dy, dx)`.
    ///
    /// `None` for the origin and for offsets farther than the radius.
    #[must_use]
    pub fn weight(&self, dy: isize, dx: isize) -> Option<f64> {
        let r = KERNEL_RADIUS as isize;
        if dy.abs() > r || dx.abs() > r {
            return None;
        }
        let row = (dy + r) as usize;
        let col = (dx + r) as usize;
        self.weights[row * KERNEL_SIDE + col]
    }

    /// Energy delivered over offset `(dy, dx)` by a source releasing `release`
    #[inline]
    #[must_use]
    pub fn transfer(&self, release: f64, dy: isize, dx: isize) -> Option<f64> {
        self.weight(dy, dx).map(|w| release * w / self.denominator)
    }

    /// Number of offsets inside the support (origin excluded)
    #[must_use]
    pub fn support_size(&self) -> usize {
        self.weights.iter().filter(|w| w.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_is_memoized_and_deterministic() {
        let recomputed = EnergyKernel::compute();
        assert_eq!(
            kernel().denominator().to_bits(),
            recomputed.denominator().to_bits()
        );
        assert!(std::ptr::eq(kernel(), kernel()));
    }

    #[test]
    fn test_normalized_mass_is_one() {
        let k = kernel();
        let r = KERNEL_RADIUS as isize;
        let mut total = 0.0;
        for dy in -r..=r {
            for dx in -r..=r {
                if let Some(e) = k.transfer(1.0, dy, dx) {
                    total += e;
                }
            }
        }
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_and_outside_radius_have_no_weight() {
        let k = kernel();
        assert_eq!(k.weight(0, 0), None);
        assert_eq!(k.weight(10, 1), None); // sqrt(101) > 10
        assert_eq!(k.weight(11, 0), None);
        assert_eq!(k.weight(7, 8), None); // sqrt(113) > 10
        assert_eq!(k.weight(6, 8), Some(0.01)); // exactly on the radius
    }

    #[test]
    fn test_inverse_square_weights() {
        let k = kernel();
        assert_relative_eq!(k.weight(0, 1).unwrap_or_default(), 1.0);
        assert_relative_eq!(k.weight(1, 1).unwrap_or_default(), 0.5, epsilon = 1e-15);
        assert_relative_eq!(k.weight(-3, 0).unwrap_or_default(), 1.0 / 9.0, epsilon = 1e-15);
    }

    #[test]
    fn test_kernel_symmetry() {
        let k = kernel();
        for (dy, dx) in [(1, 2), (3, 5), (0, 7), (6, 8)] {
            let w = k.weight(dy, dx);
            assert_eq!(w, k.weight(-dy, dx));
            assert_eq!(w, k.weight(dy, -dx));
            assert_eq!(w, k.weight(dx, dy));
        }
    }

    #[test]
    fn test_support_size() {
        // Integer lattice points with 0 < dy² + dx² <= 100
        let mut expected = 0;
        for dy in -10_i32..=10 {
            for dx in -10_i32..=10 {
                let d2 = dy * dy + dx * dx;
                if d2 > 0 && d2 <= 100 {
                    expected += 1;
                }
            }
        }
        assert_eq!(kernel().support_size(), expected);
    }

    #[test]
    fn test_euclidean_distance() {
        let d = euclidean_distance(Pixel::new(0, 0), Pixel::new(3, 4));
        assert_relative_eq!(d, 5.0);
        let d = euclidean_distance(Pixel::new(5, 2), Pixel::new(2, 6));
        assert_relative_eq!(d, 5.0);
    }
}
