//! Spring parameter derivation for p-y, t-z, and q-z soil springs
//!
//! Pure functions mapping soil/pile/geometry scalars to an ultimate
//! resistance and a characteristic displacement (the displacement at half
//! the ultimate). Lateral capacity follows the API (1987) sand wedge or
//! Brinch Hansen (1961), selectable per run; the lateral subgrade modulus
//! comes from the API (1987) chart with an optional overburden correction
//! after Boulanger et al. Shaft friction uses the API beta method with
//! Mosher (1984) initial stiffness; toe bearing uses Vesic's rigidity-index
//! bearing factor with the Vijayvergiya q-z shape.
//!
//! Effective vertical stress is passed in explicitly so layered overburden
//! is honored; the formulas use it wherever the textbook forms write γ·z.
//!
//! The numbers these functions return are an external contract: the unit
//! tests pin concrete values, not just trends.

use serde::{Deserialize, Serialize};

/// Ultimate lateral resistance formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PultMethod {
    /// API (1987) / Reese et al. sand wedge
    Api,
    /// Brinch Hansen (1961) earth pressure coefficient
    BrinchHansen,
}

/// Lateral subgrade modulus formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubgradeMethod {
    /// Modulus linear in depth (API 1987 chart value as-is)
    ApiLinear,
    /// Parabolic overburden correction after Boulanger et al.
    BoulangerParabolic,
}

/// Position of the groundwater table relative to the spring depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GwtState {
    Above,
    Below,
}

/// Ultimate resistance and characteristic displacement of one soil spring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringCurve {
    /// Ultimate resistance (nodal force for the tributary length)
    pub ult: f64,
    /// Displacement at which half the ultimate resistance is mobilized
    pub disp50: f64,
}

impl SpringCurve {
    /// True when both parameters are physically usable
    pub fn is_physical(&self) -> bool {
        self.ult > 0.0 && self.disp50 > 0.0
    }
}

/// atanh(1/2), relates the initial tangent to disp50 for the tanh backbone
pub const ATANH_HALF: f64 = 0.549306144334055;

// API (1987) chart of initial subgrade modulus vs friction angle, lb/in³,
// separate curves above/below the water table; converted by LBIN3_TO_KNM3.
const K_PHI: [f64; 13] = [
    28.8, 29.5, 30.0, 31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0, 38.0, 39.0, 40.0,
];
const K_ABOVE: [f64; 13] = [
    10.0, 23.0, 45.0, 61.0, 80.0, 100.0, 120.0, 140.0, 160.0, 182.0, 215.0, 250.0, 275.0,
];
const K_BELOW: [f64; 13] = [
    10.0, 20.0, 29.0, 33.0, 38.0, 43.0, 49.0, 57.0, 65.0, 75.0, 91.0, 100.0, 110.0,
];
const LBIN3_TO_KNM3: f64 = 271.45;

// Mosher (1984) shaft stiffness vs friction angle, psf/in, converted by
// PSFIN_TO_KNM3.
const KF_PHI: [f64; 6] = [28.0, 31.0, 32.0, 34.0, 35.0, 38.0];
const KF: [f64; 6] = [6000.0, 10000.0, 10000.0, 14000.0, 14000.0, 18000.0];
const PSFIN_TO_KNM3: f64 = 1.885;

const SIGV_FLOOR: f64 = 0.01;
const SURFACE_PU: f64 = 0.01;

/// Linear interpolation in a tabulated curve, clamped at the table ends
fn interp(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }
    for i in 1..xs.len() {
        if x <= xs[i] {
            let t = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
            return ys[i - 1] + t * (ys[i] - ys[i - 1]);
        }
    }
    ys[ys.len() - 1]
}

/// Ultimate lateral line resistance (force per length) at depth `z`
fn pu_api(z: f64, sig_v: f64, phi: f64, b: f64) -> f64 {
    if z <= 0.0 {
        return SURFACE_PU;
    }
    let a = (3.0 - 0.8 * z / b).max(0.9);

    let alpha = phi / 2.0;
    let beta = std::f64::consts::FRAC_PI_4 + phi / 2.0;
    let k0 = 0.4;
    let ka = (std::f64::consts::FRAC_PI_4 - phi / 2.0).tan().powi(2);

    let c1 = k0 * phi.tan() * beta.sin() / ((beta - phi).tan() * alpha.cos());
    let c2 = (beta.tan() / (beta - phi).tan()) * beta.tan() * alpha.tan();
    let c3 = k0 * beta.tan() * (phi.tan() * beta.sin() - alpha.tan());
    let c4 = beta.tan() / (beta - phi).tan() - ka;
    let c5 = ka * (beta.tan().powi(8) - 1.0);
    let c6 = k0 * phi.tan() * beta.tan().powi(4);

    // shallow wedge failure vs deep flow-around failure
    let p_shallow = sig_v * (z * (c1 + c2 + c3) + b * c4);
    let p_deep = b * sig_v * (c5 + c6);

    a * p_shallow.min(p_deep)
}

fn pu_brinch_hansen(z: f64, sig_v: f64, phi: f64, b: f64) -> f64 {
    if z <= 0.0 {
        return SURFACE_PU;
    }
    let tan_phi = phi.tan();
    let t_plus = (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan();
    let t_minus = (std::f64::consts::FRAC_PI_4 - phi / 2.0).tan();

    // earth pressure coefficient at the surface
    let kq0 = ((std::f64::consts::FRAC_PI_2 + phi) * tan_phi).exp() * phi.cos() * t_plus
        - (-(std::f64::consts::FRAC_PI_2 - phi) * tan_phi).exp() * phi.cos() * t_minus;

    // and its limit at great depth
    let dc_inf = 1.58 + 4.09 * tan_phi.powi(4);
    let nc = (1.0 / tan_phi) * (std::f64::consts::PI * tan_phi).exp() * (t_plus * t_plus - 1.0);
    let k0h = 1.0 - phi.sin();
    let kc_inf = nc * dc_inf;
    let kq_inf = kc_inf * k0h * tan_phi;

    let aq = (kq0 / (kq_inf - kq0))
        * (k0h * phi.sin() / (std::f64::consts::FRAC_PI_4 + phi / 2.0).sin());
    let zb = z / b;
    let kq = (kq0 + kq_inf * aq * zb) / (1.0 + aq * zb);

    sig_v * kq * b
}

/// Lateral subgrade modulus in kN/m³
fn subgrade_modulus(phi_deg: f64, sig_v: f64, method: SubgradeMethod, gwt: GwtState) -> f64 {
    let table = match gwt {
        GwtState::Above => &K_BELOW, // spring below the table
        GwtState::Below => &K_ABOVE,
    };
    let mut k = interp(&K_PHI, table, phi_deg) * LBIN3_TO_KNM3;
    if let SubgradeMethod::BoulangerParabolic = method {
        let c_sigma = (50.0 / sig_v.max(SIGV_FLOOR)).sqrt();
        k *= c_sigma;
    }
    k
}

/// Lateral p-y spring parameters at depth `z` (positive down).
///
/// `sig_v` is the effective vertical stress at `z`, `trib_length` the
/// element length tributary to the node. The returned `ult` is a nodal
/// force; divide by `trib_length` to recover the line capacity.
#[allow(clippy::too_many_arguments)]
pub fn py_curve(
    z: f64,
    sig_v: f64,
    phi_deg: f64,
    diameter: f64,
    trib_length: f64,
    pult_method: PultMethod,
    subgrade_method: SubgradeMethod,
    gwt: GwtState,
) -> SpringCurve {
    let phi = phi_deg.to_radians();
    let pu = match pult_method {
        PultMethod::Api => pu_api(z, sig_v, phi, diameter),
        PultMethod::BrinchHansen => pu_brinch_hansen(z, sig_v, phi, diameter),
    };
    let k = subgrade_modulus(phi_deg, sig_v, subgrade_method, gwt);
    let y50 = ATANH_HALF * pu / (k * z.max(SIGV_FLOOR));
    SpringCurve {
        ult: pu * trib_length,
        disp50: y50,
    }
}

/// Axial shaft-friction t-z spring parameters.
///
/// Beta method with interface friction δ = 0.8·φ and K = 0.4; initial
/// stiffness from the Mosher (1984) chart.
pub fn tz_curve(phi_deg: f64, diameter: f64, sig_v: f64, trib_length: f64) -> SpringCurve {
    let delta = 0.8 * phi_deg.to_radians();
    let sig_v = sig_v.max(SIGV_FLOOR);
    // shaft friction per unit length of pile
    let tu = 0.4 * sig_v * std::f64::consts::PI * diameter * delta.tan();
    let kf = interp(&KF_PHI, &KF, phi_deg) * PSFIN_TO_KNM3;
    let z50 = tu / (kf * std::f64::consts::PI * diameter);
    SpringCurve {
        ult: tu * trib_length,
        disp50: z50,
    }
}

/// Axial toe-bearing q-z spring parameters.
///
/// Vesic bearing factor from the rigidity index Ir = G/(σv·tanφ);
/// characteristic displacement from the Vijayvergiya shape with a critical
/// displacement of 5% of the diameter.
pub fn qz_curve(phi_deg: f64, diameter: f64, sig_v_toe: f64, g_modulus: f64) -> SpringCurve {
    let phi = phi_deg.to_radians();
    let sig_v = sig_v_toe.max(SIGV_FLOOR);
    let ir = g_modulus / (sig_v * phi.tan());
    let nq = (3.0 / (3.0 - phi.sin()))
        * ((std::f64::consts::FRAC_PI_2 - phi) * phi.tan()).exp()
        * (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().powi(2)
        * ir.powf(4.0 * phi.sin() / (3.0 * (1.0 + phi.sin())));
    let qu = nq * sig_v;
    let zc = 0.05 * diameter;
    SpringCurve {
        ult: qu * std::f64::consts::PI * diameter * diameter / 4.0,
        disp50: 0.125 * zc,
    }
}
