//! Section properties for beam-column elements

use serde::{Deserialize, Serialize};

use crate::math::{beam_local_stiffness, Mat12};

/// Linear-elastic 3D beam section: material and geometric properties
/// bundled together, one shared instance per pile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticSection {
    /// Modulus of elasticity in kPa
    pub e: f64,
    /// Shear modulus in kPa
    pub g: f64,
    /// Cross-sectional area in m²
    pub a: f64,
    /// Moment of inertia about local y-axis in m⁴
    pub iy: f64,
    /// Moment of inertia about local z-axis in m⁴
    pub iz: f64,
    /// Torsional constant in m⁴
    pub j: f64,
}

impl ElasticSection {
    pub fn new(e: f64, g: f64, a: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self { e, g, a, iy, iz, j }
    }

    /// Solid circular pile section. Shear modulus is taken as E/2.6
    /// (Poisson's ratio 0.3); the torsional constant is set very large
    /// since pile torsion is restrained elsewhere.
    pub fn circular_pile(diameter: f64, e_modulus: f64) -> Self {
        let a = 0.25 * std::f64::consts::PI * diameter * diameter;
        let iz = 0.0625 * a * diameter * diameter;
        Self {
            e: e_modulus,
            g: e_modulus / 2.6,
            a,
            iy: iz,
            iz,
            j: 1.0e10,
        }
    }

    /// Effectively rigid cap beam section built from accumulated axial,
    /// bending, and torsional rigidities (E and G are folded in as 1.0)
    pub fn rigid_cap(ea: f64, ei: f64, gj: f64) -> Self {
        Self {
            e: 1.0,
            g: 1.0,
            a: ea,
            iy: ei,
            iz: ei,
            j: gj,
        }
    }

    /// Local 12x12 stiffness matrix for an element of the given length
    pub fn local_stiffness(&self, length: f64) -> Mat12 {
        beam_local_stiffness(self.e, self.g, self.a, self.iy, self.iz, self.j, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_pile_section() {
        let s = ElasticSection::circular_pile(1.0, 25.0e6);
        assert_relative_eq!(s.a, std::f64::consts::PI / 4.0, epsilon = 1e-12);
        // 0.0625 * A * d^2 equals pi d^4 / 64
        assert_relative_eq!(s.iz, std::f64::consts::PI / 64.0, epsilon = 1e-12);
        assert_relative_eq!(s.iy, s.iz, epsilon = 1e-15);
        assert_relative_eq!(s.g, 25.0e6 / 2.6, epsilon = 1e-6);
    }

    #[test]
    fn test_local_stiffness_axial_term() {
        let s = ElasticSection::circular_pile(1.0, 25.0e6);
        let k = s.local_stiffness(2.0);
        assert_relative_eq!(k[(0, 0)], s.e * s.a / 2.0, max_relative = 1e-12);
        assert_relative_eq!(k[(0, 6)], -s.e * s.a / 2.0, max_relative = 1e-12);
    }
}
