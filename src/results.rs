//! Result types for pile group analysis

use serde::{Deserialize, Serialize};

use crate::elements::SpringKind;

/// Non-fatal issues collected while building and running an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A derived spring curve had a non-positive ultimate or
    /// characteristic displacement; analysis proceeded with it
    NonPhysicalSpring {
        pile: usize,
        layer: usize,
        kind: SpringKind,
        depth: f64,
        sig_v: f64,
        diameter: f64,
        trib_length: f64,
        ult: f64,
        disp50: f64,
    },
    /// Generated pile/cap node count differs from the sizing prediction
    MeshCountMismatch { expected: usize, generated: usize },
    /// The layer-by-layer node walk did not land back on the surface
    SurfaceMismatch { pile: usize, z: f64 },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::NonPhysicalSpring {
                pile,
                layer,
                kind,
                depth,
                sig_v,
                diameter,
                trib_length,
                ult,
                disp50,
            } => write!(
                f,
                "non-physical {kind:?} spring: pile {pile} layer {layer} depth {depth:.3} \
                 sigV {sig_v:.3} diameter {diameter:.3} tributary {trib_length:.3} \
                 -> ult {ult:.4}, disp50 {disp50:.6}"
            ),
            Diagnostic::MeshCountMismatch {
                expected,
                generated,
            } => write!(
                f,
                "mesh consistency: {generated} nodes generated but {expected} expected"
            ),
            Diagnostic::SurfaceMismatch { pile, z } => {
                write!(f, "node generation for pile {pile} reached the surface at z = {z:.4}")
            }
        }
    }
}

/// Response series along one pile, ordered bottom to top
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PileSeries {
    /// Node elevation (z, negative below grade)
    pub location: Vec<f64>,
    /// Horizontal displacement
    pub displacement: Vec<f64>,
    /// Shear force at the node (from the element below it)
    pub shear: Vec<f64>,
    /// Bending moment at the node (from the element below it)
    pub moment: Vec<f64>,
    /// Effective vertical soil stress at the node depth
    pub stress: Vec<f64>,
    /// Ultimate lateral line resistance of the spring at the node
    pub pult: Vec<f64>,
    /// Characteristic lateral spring displacement at the node
    pub y50: Vec<f64>,
}

/// Running extremes across all piles, for consistent plot scaling
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Extremes {
    pub min_displacement: f64,
    pub max_displacement: f64,
    pub min_shear: f64,
    pub max_shear: f64,
    pub min_moment: f64,
    pub max_moment: f64,
}

/// Output of one analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub piles: Vec<PileSeries>,
    pub extremes: Extremes,
    pub converged: bool,
    pub diagnostics: Vec<Diagnostic>,
}
