//! Layered soil profile with depth-dependent effective vertical stress
//!
//! A [`SoilProfile`] is an ordered stack of horizontal layers. Each layer
//! stores its material parameters plus derived state (depth of its top,
//! groundwater head relative to its top, effective stress at top and
//! bottom). Setters clamp to physical minimums and return the value that
//! was actually stored; derived state is refreshed by an explicit call to
//! [`SoilProfile::recompute`] so that bulk edits do not trigger redundant
//! cascades.

use serde::{Deserialize, Serialize};

use crate::error::{PileError, PileResult};

/// Unit weight of water in kN/m³
pub const GAMMA_WATER: f64 = 9.81;

/// A single horizontal soil layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilLayer {
    /// Layer name (display only)
    pub name: String,
    thickness: f64,
    /// Dry unit weight in kN/m³
    gamma_dry: f64,
    /// Saturated unit weight in kN/m³
    gamma_sat: f64,
    /// Friction angle in degrees
    phi: f64,
    /// Cohesion in kPa
    cohesion: f64,
    /// Shear stiffness (modulus) in kPa
    g_modulus: f64,

    // derived state, valid after SoilProfile::recompute
    #[serde(skip)]
    top_depth: f64,
    #[serde(skip)]
    gw_head: f64,
    #[serde(skip)]
    top_stress: f64,
    #[serde(skip)]
    bottom_stress: f64,
}

impl SoilLayer {
    pub fn new(
        name: &str,
        thickness: f64,
        gamma_dry: f64,
        gamma_sat: f64,
        phi: f64,
        cohesion: f64,
        g_modulus: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            thickness: thickness.max(MIN_THICKNESS),
            gamma_dry: gamma_dry.max(0.5 * GAMMA_WATER),
            gamma_sat: gamma_sat.max(GAMMA_WATER),
            phi: phi.max(MIN_PHI),
            cohesion,
            g_modulus: g_modulus.max(MIN_STIFFNESS),
            top_depth: 0.0,
            gw_head: 0.0,
            top_stress: 0.0,
            bottom_stress: 0.0,
        }
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn gamma_dry(&self) -> f64 {
        self.gamma_dry
    }

    pub fn gamma_sat(&self) -> f64 {
        self.gamma_sat
    }

    /// Friction angle in degrees
    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn cohesion(&self) -> f64 {
        self.cohesion
    }

    pub fn g_modulus(&self) -> f64 {
        self.g_modulus
    }

    /// Depth of the layer top below the ground surface
    pub fn top_depth(&self) -> f64 {
        self.top_depth
    }

    /// Groundwater table depth measured from the layer top (negative when
    /// the table lies above the layer)
    pub fn gw_head(&self) -> f64 {
        self.gw_head
    }

    /// Effective vertical stress at the layer top
    pub fn top_stress(&self) -> f64 {
        self.top_stress
    }

    /// Effective vertical stress at the layer bottom
    pub fn bottom_stress(&self) -> f64 {
        self.bottom_stress
    }

    /// Effective vertical stress at `depth` below the layer top.
    ///
    /// Dry unit weight applies above the groundwater table, buoyant unit
    /// weight (saturated minus water) below it. A table crossing inside
    /// the layer splits the integration at the crossing, so the stress
    /// profile stays continuous there. Depths above the layer top return
    /// the top stress.
    pub fn effective_stress(&self, depth: f64) -> f64 {
        if depth <= 0.0 {
            return self.top_stress;
        }
        let buoyant = self.gamma_sat - GAMMA_WATER;
        if self.gw_head <= 0.0 {
            // table at or above the layer top
            self.top_stress + buoyant * depth
        } else if depth <= self.gw_head {
            self.top_stress + self.gamma_dry * depth
        } else {
            self.top_stress + self.gamma_dry * self.gw_head + buoyant * (depth - self.gw_head)
        }
    }
}

const MIN_THICKNESS: f64 = 0.10;
const MIN_PHI: f64 = 1.0;
const MIN_STIFFNESS: f64 = 1.0;

/// Ordered stack of soil layers plus the global groundwater table depth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilProfile {
    layers: Vec<SoilLayer>,
    gw_depth: f64,
}

impl SoilProfile {
    pub fn new(layers: Vec<SoilLayer>, gw_depth: f64) -> Self {
        let mut profile = Self {
            layers,
            gw_depth: gw_depth.max(0.0),
        };
        profile.recompute();
        profile
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, idx: usize) -> PileResult<&SoilLayer> {
        self.layers.get(idx).ok_or(PileError::LayerNotFound(idx))
    }

    pub fn layers(&self) -> &[SoilLayer] {
        &self.layers
    }

    /// Groundwater table depth below the ground surface
    pub fn gw_depth(&self) -> f64 {
        self.gw_depth
    }

    /// Total depth of the defined soil column
    pub fn base_depth(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }

    pub fn set_thickness(&mut self, idx: usize, value: f64) -> PileResult<f64> {
        let layer = self.layer_mut(idx)?;
        layer.thickness = value.max(MIN_THICKNESS);
        Ok(layer.thickness)
    }

    pub fn set_gamma_dry(&mut self, idx: usize, value: f64) -> PileResult<f64> {
        let layer = self.layer_mut(idx)?;
        layer.gamma_dry = value.max(0.5 * GAMMA_WATER);
        Ok(layer.gamma_dry)
    }

    pub fn set_gamma_sat(&mut self, idx: usize, value: f64) -> PileResult<f64> {
        let layer = self.layer_mut(idx)?;
        layer.gamma_sat = value.max(GAMMA_WATER);
        Ok(layer.gamma_sat)
    }

    pub fn set_phi(&mut self, idx: usize, value: f64) -> PileResult<f64> {
        let layer = self.layer_mut(idx)?;
        layer.phi = value.max(MIN_PHI);
        Ok(layer.phi)
    }

    pub fn set_cohesion(&mut self, idx: usize, value: f64) -> PileResult<f64> {
        let layer = self.layer_mut(idx)?;
        layer.cohesion = value;
        Ok(layer.cohesion)
    }

    pub fn set_stiffness(&mut self, idx: usize, value: f64) -> PileResult<f64> {
        let layer = self.layer_mut(idx)?;
        layer.g_modulus = value.max(MIN_STIFFNESS);
        Ok(layer.g_modulus)
    }

    pub fn set_gw_depth(&mut self, value: f64) -> f64 {
        self.gw_depth = value.max(0.0);
        self.gw_depth
    }

    /// Refresh derived state (layer-top depths, per-layer groundwater head,
    /// top/bottom effective stress) cascading in index order. Must be
    /// called after edits before any other component reads the profile.
    pub fn recompute(&mut self) {
        let mut top_depth = 0.0;
        let mut top_stress = 0.0;
        for layer in &mut self.layers {
            layer.top_depth = top_depth;
            layer.gw_head = self.gw_depth - top_depth;
            layer.top_stress = top_stress;
            layer.bottom_stress = layer.effective_stress(layer.thickness);
            top_depth += layer.thickness;
            top_stress = layer.bottom_stress;
        }
    }

    /// Effective vertical stress at `depth` below the top of layer `idx`
    pub fn effective_stress_in(&self, idx: usize, depth: f64) -> PileResult<f64> {
        Ok(self.layer(idx)?.effective_stress(depth))
    }

    /// Index of the layer containing the given depth below the surface.
    /// Depths beyond the soil column land in the last layer.
    pub fn layer_at(&self, depth: f64) -> usize {
        let mut bottom = 0.0;
        for (i, layer) in self.layers.iter().enumerate() {
            bottom += layer.thickness;
            if depth <= bottom {
                return i;
            }
        }
        self.layers.len().saturating_sub(1)
    }

    fn layer_mut(&mut self, idx: usize) -> PileResult<&mut SoilLayer> {
        self.layers.get_mut(idx).ok_or(PileError::LayerNotFound(idx))
    }
}

impl Default for SoilProfile {
    fn default() -> Self {
        Self::new(
            vec![
                SoilLayer::new("Layer 1", 3.0, 15.0, 18.0, 30.0, 0.0, 2.0e5),
                SoilLayer::new("Layer 2", 3.0, 16.0, 19.0, 35.0, 0.0, 2.0e5),
                SoilLayer::new("Layer 3", 4.0, 14.0, 17.0, 25.0, 0.0, 2.0e5),
            ],
            4.0,
        )
    }
}
