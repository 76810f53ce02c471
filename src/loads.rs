//! Load cases applied to the pile group

use serde::{Deserialize, Serialize};

/// Exactly one load-control mode is active per analysis.
///
/// Forces and prescribed displacements are applied at the head of the
/// leftmost pile; a soil-motion profile prescribes horizontal soil
/// displacement along the whole soil column instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadCase {
    /// Applied horizontal force, vertical force, and moment (kN, kN, kNm)
    ForceControl {
        h_force: f64,
        v_force: f64,
        moment: f64,
    },
    /// Prescribed horizontal and vertical pile head displacement (m)
    Pushover { h_disp: f64, v_disp: f64 },
    /// Prescribed free-field soil displacement: surface magnitude plus
    /// fractions retained at the first interface, second interface, and
    /// the base of the soil column
    SoilMotion {
        surface_disp: f64,
        pct12: f64,
        pct23: f64,
        pct_base: f64,
    },
}

impl LoadCase {
    /// Horizontal free-field displacement at `depth`, interpolated
    /// linearly between the surface, the two layer interfaces, and the
    /// soil-column base. Zero for non-soil-motion cases.
    pub fn soil_displacement(&self, depth: f64, interface1: f64, interface2: f64, base: f64) -> f64 {
        match *self {
            LoadCase::SoilMotion {
                surface_disp,
                pct12,
                pct23,
                pct_base,
            } => {
                let breaks = [
                    (0.0, 1.0),
                    (interface1, pct12),
                    (interface2, pct23),
                    (base, pct_base),
                ];
                if depth <= 0.0 {
                    return surface_disp;
                }
                for w in breaks.windows(2) {
                    let (d0, f0) = w[0];
                    let (d1, f1) = w[1];
                    if depth <= d1 {
                        if d1 - d0 < 1e-12 {
                            return surface_disp * f1;
                        }
                        let t = (depth - d0) / (d1 - d0);
                        return surface_disp * (f0 + t * (f1 - f0));
                    }
                }
                surface_disp * pct_base
            }
            _ => 0.0,
        }
    }
}

impl Default for LoadCase {
    fn default() -> Self {
        LoadCase::ForceControl {
            h_force: 1000.0,
            v_force: 0.0,
            moment: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_soil_motion_profile() {
        let case = LoadCase::SoilMotion {
            surface_disp: 0.1,
            pct12: 0.5,
            pct23: 0.25,
            pct_base: 0.0,
        };
        assert_relative_eq!(case.soil_displacement(0.0, 3.0, 6.0, 10.0), 0.1);
        assert_relative_eq!(case.soil_displacement(3.0, 3.0, 6.0, 10.0), 0.05);
        assert_relative_eq!(case.soil_displacement(4.5, 3.0, 6.0, 10.0), 0.0375);
        assert_relative_eq!(case.soil_displacement(10.0, 3.0, 6.0, 10.0), 0.0);
        // past the base the basal fraction holds
        assert_relative_eq!(case.soil_displacement(15.0, 3.0, 6.0, 10.0), 0.0);
    }

    #[test]
    fn test_force_control_has_no_soil_displacement() {
        let case = LoadCase::default();
        assert_relative_eq!(case.soil_displacement(2.0, 3.0, 6.0, 10.0), 0.0);
    }
}
