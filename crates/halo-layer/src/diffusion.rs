//! Jacobi-style diffusion over a [`ValueLayer`].
//!
//! Every owned cell is recomputed from its `(2r+1)^N` neighborhood in the
//! current bank. Results go to the other bank, the banks swap in one step,
//! and the halo is refreshed from the post-swap bank.

use crate::error::LayerError;
use crate::value_layer::ValueLayer;
use halo_core::{Communicator, GridDimensions};
use halo_topology::{CartesianTopology, DecompositionConfig, RelativeLocation};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Computes a cell's next value from its neighborhood.
///
/// `values` holds the `(2r+1)^N` cells around the target in
/// [`RelativeLocation`] enumeration order (dimension 0 fastest, starting at
/// `[-r; N]`), so the target itself sits at `values.len() / 2`.
pub trait Diffusor {
    /// Neighborhood radius. Must not exceed the layer's buffer depth.
    fn radius(&self) -> usize {
        1
    }

    /// The new value of the center cell.
    fn new_value(&self, values: &[f64]) -> f64;
}

impl<F> Diffusor for F
where
    F: Fn(&[f64]) -> f64,
{
    fn new_value(&self, values: &[f64]) -> f64 {
        self(values)
    }
}

/// Box average over the `(2r+1)^N` neighborhood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeanDiffusor {
    radius: usize,
}

impl MeanDiffusor {
    /// Average over radius `radius`, raised to at least 1.
    pub fn new(radius: usize) -> Self {
        Self {
            radius: radius.max(1),
        }
    }
}

impl Default for MeanDiffusor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Diffusor for MeanDiffusor {
    fn radius(&self) -> usize {
        self.radius
    }

    fn new_value(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Blend of a cell with the mean of its neighbors, with exponential decay.
///
/// ```text
/// next = ((1 - coefficient) * center + coefficient * mean(others)) * exp(-decay)
/// ```
///
/// Constructed via [`WeightedDiffusor::builder`]:
///
/// ```
/// use halo_layer::WeightedDiffusor;
///
/// let d = WeightedDiffusor::builder()
///     .coefficient(0.5)
///     .decay(0.0)
///     .build()
///     .unwrap();
/// assert_eq!(halo_layer::Diffusor::new_value(&d, &[0.0, 4.0, 4.0]), 3.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedDiffusor {
    coefficient: f64,
    decay_factor: f64,
    radius: usize,
}

/// Builder for [`WeightedDiffusor`].
///
/// Defaults: zero coefficient, zero decay, radius 1.
#[derive(Clone, Debug)]
pub struct WeightedDiffusorBuilder {
    coefficient: f64,
    decay: f64,
    radius: usize,
}

impl WeightedDiffusor {
    /// Start configuring a weighted diffusor.
    pub fn builder() -> WeightedDiffusorBuilder {
        WeightedDiffusorBuilder {
            coefficient: 0.0,
            decay: 0.0,
            radius: 1,
        }
    }

    /// Weight of the neighbor mean.
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }
}

impl WeightedDiffusorBuilder {
    /// Weight of the neighbor mean, in `[0, ∞)`.
    pub fn coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Per-step exponential decay rate, in `[0, ∞)`.
    pub fn decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Neighborhood radius, at least 1.
    pub fn radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<WeightedDiffusor, String> {
        if !self.coefficient.is_finite() || self.coefficient < 0.0 {
            return Err(format!(
                "coefficient must be finite and >= 0, got {}",
                self.coefficient
            ));
        }
        if !self.decay.is_finite() || self.decay < 0.0 {
            return Err(format!(
                "decay must be finite and >= 0, got {}",
                self.decay
            ));
        }
        if self.radius == 0 {
            return Err("radius must be at least 1".to_string());
        }
        Ok(WeightedDiffusor {
            coefficient: self.coefficient,
            decay_factor: (-self.decay).exp(),
            radius: self.radius,
        })
    }
}

impl Diffusor for WeightedDiffusor {
    fn radius(&self) -> usize {
        self.radius
    }

    fn new_value(&self, values: &[f64]) -> f64 {
        let Some(&center) = values.get(values.len() / 2) else {
            return 0.0;
        };
        let blended = if values.len() > 1 {
            let others = (values.iter().sum::<f64>() - center) / (values.len() - 1) as f64;
            (1.0 - self.coefficient) * center + self.coefficient * others
        } else {
            center
        };
        blended * self.decay_factor
    }
}

/// A [`ValueLayer`] that can diffuse.
///
/// Dereferences to the underlying layer for access, initialization, and
/// exchange.
#[derive(Debug)]
pub struct DiffusionLayer {
    layer: ValueLayer,
}

impl DiffusionLayer {
    /// Build a diffusion layer; see [`ValueLayer::new`].
    pub fn new(
        comm: Arc<dyn Communicator>,
        topology: Arc<CartesianTopology>,
        global: GridDimensions<i32>,
        buffer: usize,
        initial: f64,
    ) -> Result<Self, LayerError> {
        ValueLayer::new(comm, topology, global, buffer, initial).map(Self::from)
    }

    /// Build a diffusion layer; see [`ValueLayer::from_config`].
    pub fn from_config(
        comm: Arc<dyn Communicator>,
        config: &DecompositionConfig<i32>,
        initial: f64,
    ) -> Result<Self, LayerError> {
        ValueLayer::from_config(comm, config, initial).map(Self::from)
    }

    /// Unwrap the underlying layer.
    pub fn into_inner(self) -> ValueLayer {
        self.layer
    }

    /// One diffusion step followed by a halo refresh.
    pub fn diffuse(&mut self, diffusor: &dyn Diffusor) -> Result<(), LayerError> {
        self.step(diffusor, "diffuse")?;
        self.layer.exchange("diffuse")
    }

    /// One diffusion step without the trailing halo refresh.
    ///
    /// The halo of the new current bank still holds the pre-step values.
    pub fn diffuse_without_sync(&mut self, diffusor: &dyn Diffusor) -> Result<(), LayerError> {
        self.step(diffusor, "diffuse_without_sync")
    }

    fn step(&mut self, diffusor: &dyn Diffusor, op: &'static str) -> Result<(), LayerError> {
        self.layer.ensure_open(op)?;
        let radius = diffusor.radius();
        if radius > self.layer.buffer() {
            return Err(LayerError::RadiusExceedsBuffer {
                radius,
                buffer: self.layer.buffer(),
            });
        }
        let Some(cells) = self.layer.owned_cells() else {
            return Ok(());
        };

        let places = self.layer.places().to_vec();
        let stencil: Vec<isize> = RelativeLocation::uniform(places.len(), radius)
            .values()
            .map(|v| {
                v.iter()
                    .zip(&places)
                    .map(|(&o, &p)| o as isize * p as isize)
                    .sum()
            })
            .collect();
        let targets: Vec<usize> = cells.values().map(|c| self.layer.owned_index(&c)).collect();

        let (current, other) = self.layer.banks_mut().read_write();
        other.copy_from_slice(current);
        let mut hood = vec![0.0; stencil.len()];
        for &t in &targets {
            for (slot, &off) in hood.iter_mut().zip(&stencil) {
                *slot = current[(t as isize + off) as usize];
            }
            other[t] = diffusor.new_value(&hood);
        }
        self.layer.banks_mut().swap();
        log::trace!(
            "rank {} {op}: {} cells, radius {radius}",
            self.layer.rank(),
            targets.len()
        );
        Ok(())
    }
}

impl From<ValueLayer> for DiffusionLayer {
    fn from(layer: ValueLayer) -> Self {
        Self { layer }
    }
}

impl Deref for DiffusionLayer {
    type Target = ValueLayer;

    fn deref(&self) -> &ValueLayer {
        &self.layer
    }
}

impl DerefMut for DiffusionLayer {
    fn deref_mut(&mut self) -> &mut ValueLayer {
        &mut self.layer
    }
}
