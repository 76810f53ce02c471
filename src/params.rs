//! Analysis parameter set: piles, meshing bounds, display options

use serde::{Deserialize, Serialize};

use crate::error::{PileError, PileResult};
use crate::loads::LoadCase;
use crate::soil::SoilProfile;
use crate::springs::{PultMethod, SubgradeMethod};

/// Hard cap on the number of piles in a group
pub const MAX_PILES: usize = 25;

/// One pile of the group. The free-standing length above grade is shared
/// by all piles and lives on [`PileGroupParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pile {
    /// Embedded length below grade in m
    pub embedded_length: f64,
    /// Diameter in m
    pub diameter: f64,
    /// Elastic modulus in kPa
    pub e_modulus: f64,
    /// Horizontal offset from the group origin in m
    pub x_offset: f64,
}

impl Default for Pile {
    fn default() -> Self {
        Self {
            embedded_length: 20.0,
            diameter: 1.0,
            e_modulus: 25.0e6,
            x_offset: 0.0,
        }
    }
}

/// Meshing density bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaParameters {
    pub min_elements_per_layer: usize,
    pub max_elements_per_layer: usize,
    pub num_elements_in_air: usize,
}

impl FeaParameters {
    /// Clamp loaded values to the supported ranges
    pub fn clamped(self) -> Self {
        Self {
            min_elements_per_layer: self.min_elements_per_layer.max(15),
            max_elements_per_layer: self.max_elements_per_layer.min(120),
            num_elements_in_air: self.num_elements_in_air.clamp(4, 40),
        }
    }
}

impl Default for FeaParameters {
    fn default() -> Self {
        Self {
            min_elements_per_layer: 15,
            max_elements_per_layer: 40,
            num_elements_in_air: 4,
        }
    }
}

/// Which result categories a front end wants to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub displacements: bool,
    pub moments: bool,
    pub shear: bool,
    pub stress: bool,
    pub pult: bool,
    pub y50: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            displacements: true,
            moments: true,
            shear: true,
            stress: true,
            pult: true,
            y50: true,
        }
    }
}

/// Full parameter set for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PileGroupParameters {
    pub soil: SoilProfile,
    piles: Vec<Pile>,
    /// Free-standing length above grade in m, shared by all piles
    pub free_length: f64,
    pub use_toe_resistance: bool,
    pub rigid_cap_connection: bool,
    pub load: LoadCase,
    pub fea: FeaParameters,
    pub pult_method: PultMethod,
    pub subgrade_method: SubgradeMethod,
}

impl PileGroupParameters {
    pub fn piles(&self) -> &[Pile] {
        &self.piles
    }

    pub fn num_piles(&self) -> usize {
        self.piles.len()
    }

    pub fn pile(&self, idx: usize) -> PileResult<&Pile> {
        self.piles.get(idx).ok_or(PileError::PileNotFound(idx))
    }

    pub fn pile_mut(&mut self, idx: usize) -> PileResult<&mut Pile> {
        self.piles.get_mut(idx).ok_or(PileError::PileNotFound(idx))
    }

    /// Add a pile cloned from the last one, offset sideways by two
    /// diameters. Fails without touching the group when the cap is full.
    pub fn add_pile(&mut self) -> PileResult<usize> {
        if self.piles.len() >= MAX_PILES {
            return Err(PileError::PileCapacityExceeded(MAX_PILES));
        }
        let mut pile = self.piles.last().cloned().unwrap_or_default();
        pile.x_offset += 2.0 * pile.diameter;
        self.piles.push(pile);
        Ok(self.piles.len() - 1)
    }

    /// Remove a pile, compacting the order
    pub fn remove_pile(&mut self, idx: usize) -> PileResult<Pile> {
        if idx >= self.piles.len() {
            return Err(PileError::PileNotFound(idx));
        }
        Ok(self.piles.remove(idx))
    }

    /// Replace the pile list wholesale (used by file loading)
    pub fn set_piles(&mut self, piles: Vec<Pile>) -> PileResult<()> {
        if piles.len() > MAX_PILES {
            return Err(PileError::PileCapacityExceeded(MAX_PILES));
        }
        if piles.is_empty() {
            return Err(PileError::NoPiles);
        }
        self.piles = piles;
        Ok(())
    }
}

impl Default for PileGroupParameters {
    fn default() -> Self {
        Self {
            soil: SoilProfile::default(),
            piles: vec![Pile::default()],
            free_length: 1.0,
            use_toe_resistance: false,
            rigid_cap_connection: true,
            load: LoadCase::default(),
            fea: FeaParameters::default(),
            pult_method: PultMethod::BrinchHansen,
            subgrade_method: SubgradeMethod::ApiLinear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_pile_clones_last_with_offset() {
        let mut params = PileGroupParameters::default();
        let idx = params.add_pile().unwrap();
        assert_eq!(idx, 1);
        let p0 = params.pile(0).unwrap().clone();
        let p1 = params.pile(1).unwrap();
        assert_relative_eq!(p1.x_offset, p0.x_offset + 2.0 * p0.diameter);
        assert_relative_eq!(p1.diameter, p0.diameter);
        assert_relative_eq!(p1.embedded_length, p0.embedded_length);
    }

    #[test]
    fn test_capacity_checked_insert() {
        let mut params = PileGroupParameters::default();
        while params.num_piles() < MAX_PILES {
            params.add_pile().unwrap();
        }
        let before = params.piles().to_vec();
        let err = params.add_pile().unwrap_err();
        assert!(matches!(err, PileError::PileCapacityExceeded(25)));
        assert_eq!(params.piles(), &before[..]);
    }

    #[test]
    fn test_remove_pile_compacts() {
        let mut params = PileGroupParameters::default();
        params.add_pile().unwrap();
        params.add_pile().unwrap();
        let third_offset = params.pile(2).unwrap().x_offset;
        params.remove_pile(1).unwrap();
        assert_eq!(params.num_piles(), 2);
        assert_relative_eq!(params.pile(1).unwrap().x_offset, third_offset);
    }

    #[test]
    fn test_fea_parameter_clamps() {
        let fea = FeaParameters {
            min_elements_per_layer: 5,
            max_elements_per_layer: 500,
            num_elements_in_air: 2,
        }
        .clamped();
        assert_eq!(fea.min_elements_per_layer, 15);
        assert_eq!(fea.max_elements_per_layer, 120);
        assert_eq!(fea.num_elements_in_air, 4);

        let fea = FeaParameters {
            num_elements_in_air: 99,
            ..Default::default()
        }
        .clamped();
        assert_eq!(fea.num_elements_in_air, 40);
    }
}
