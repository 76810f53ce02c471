//! Uniaxial nonlinear spring materials

use serde::{Deserialize, Serialize};

use crate::springs::{SpringCurve, ATANH_HALF};

/// Which soil response a spring material represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpringKind {
    /// Lateral resistance
    Py,
    /// Shaft friction
    Tz,
    /// Toe bearing
    Qz,
}

/// Stiffness used when a curve has non-physical parameters, keeping the
/// system solvable while visibly distorting the affected pile's response
const FALLBACK_STIFFNESS: f64 = 1.0e-3;

/// Nonlinear elastic uniaxial spring with a tanh backbone.
///
/// f(u) = ult · tanh(k0·u/ult) with the initial tangent k0 chosen so that
/// f(disp50) = ult/2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringMaterial {
    pub kind: SpringKind,
    pub curve: SpringCurve,
}

impl SpringMaterial {
    pub fn new(kind: SpringKind, curve: SpringCurve) -> Self {
        Self { kind, curve }
    }

    /// Initial tangent stiffness
    pub fn initial_stiffness(&self) -> f64 {
        if !self.curve.is_physical() {
            return FALLBACK_STIFFNESS;
        }
        ATANH_HALF * self.curve.ult / self.curve.disp50
    }

    /// Spring force at elongation `u`
    pub fn force(&self, u: f64) -> f64 {
        if !self.curve.is_physical() {
            return FALLBACK_STIFFNESS * u;
        }
        let k0 = self.initial_stiffness();
        self.curve.ult * (k0 * u / self.curve.ult).tanh()
    }

    /// Tangent stiffness at elongation `u`.
    ///
    /// Floored at a small fraction of the initial tangent so a fully
    /// saturated spring cannot zero its diagonal stiffness term.
    pub fn tangent(&self, u: f64) -> f64 {
        if !self.curve.is_physical() {
            return FALLBACK_STIFFNESS;
        }
        let k0 = self.initial_stiffness();
        let t = (k0 * u / self.curve.ult).tanh();
        (k0 * (1.0 - t * t)).max(1.0e-9 * k0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> SpringMaterial {
        SpringMaterial::new(
            SpringKind::Py,
            SpringCurve {
                ult: 100.0,
                disp50: 0.01,
            },
        )
    }

    #[test]
    fn test_half_ultimate_at_disp50() {
        let mat = sample();
        assert_relative_eq!(mat.force(0.01), 50.0, max_relative = 1e-12);
    }

    #[test]
    fn test_force_saturates_at_ult() {
        let mat = sample();
        assert!(mat.force(1.0) <= 100.0);
        assert!(mat.force(1.0) > 99.9);
        assert_relative_eq!(mat.force(-1.0), -mat.force(1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_tangent_matches_initial_stiffness_at_origin() {
        let mat = sample();
        assert_relative_eq!(mat.tangent(0.0), mat.initial_stiffness(), epsilon = 1e-12);
        // tangent decreases monotonically with |u|
        assert!(mat.tangent(0.005) < mat.tangent(0.0));
        assert!(mat.tangent(0.02) < mat.tangent(0.005));
    }

    #[test]
    fn test_degenerate_curve_falls_back_to_linear() {
        let mat = SpringMaterial::new(
            SpringKind::Tz,
            SpringCurve {
                ult: -5.0,
                disp50: 0.001,
            },
        );
        assert_relative_eq!(mat.force(2.0), 2.0 * FALLBACK_STIFFNESS, epsilon = 1e-15);
        assert_relative_eq!(mat.tangent(2.0), FALLBACK_STIFFNESS, epsilon = 1e-15);
    }
}
