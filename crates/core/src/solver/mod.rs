//! Fire propagation engine
//!
//! This module holds the pieces that move a fire forward in time:
//!
//! - [`kernel`]: the normalized inverse-square energy transfer kernel
//! - [`active_list`]: the fixed-capacity queue of ignited pixels
//! - [`propagation`]: pixel, generation and bounded burn steps
//! - [`ignition`]: injection and placement of initial fires
//!
//! None of these own field data. The [`Landscape`](crate::simulation::Landscape)
//! owns every grid and lends them to the engine for one call at a time.
//!
//! # Backend Selection
//!
//! Generation steps run either sequentially or with the Rayon-parallel
//! contribution pass. Both produce identical fields; see
//! [`PropagationBackend`].

pub mod active_list;
pub mod ignition;
pub mod kernel;
pub mod propagation;

pub use active_list::ActiveFireList;
pub use ignition::{
    find_closest_flammable_cells, ignite, ignition_points_from_mask, FIRST_GENERATION,
};
pub use kernel::{euclidean_distance, kernel, EnergyKernel, KERNEL_RADIUS};
pub use propagation::{
    burn_all, burn_next_active_pixel, burn_next_iteration, burn_next_iteration_parallel,
    BurnBudget, BurnFields,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Strategy used to burn one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationBackend {
    /// Process sources one after another
    #[default]
    Sequential,
    /// Compute contributions with Rayon, apply them in source order
    Parallel,
}

impl PropagationBackend {
    /// Burn one generation with this backend
    ///
    /// # Errors
    ///
    /// Propagates errors from the selected generation step.
    pub fn burn_generation(
        self,
        list: &mut ActiveFireList,
        fields: &mut BurnFields<'_>,
    ) -> Result<bool> {
        match self {
            PropagationBackend::Sequential => burn_next_iteration(list, fields),
            PropagationBackend::Parallel => burn_next_iteration_parallel(list, fields),
        }
    }
}
