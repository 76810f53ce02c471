//! Pile group analysis with a beam-on-nonlinear-Winkler-foundation model
//!
//! A group of vertical piles in layered soil is meshed into 3D
//! beam-column elements chained by a stiff cap, with nonlinear p-y, t-z,
//! and q-z soil springs attached along the embedded length. The staged
//! Newton-Raphson solve returns displacement, shear, moment, and soil
//! stress profiles along every pile.
//!
//! ## Example
//! ```rust
//! use pilegroup_fea::prelude::*;
//!
//! let mut model = PileGroupModel::default();
//!
//! // two piles, lateral load at the head of the leftmost one
//! model.params.add_pile().unwrap();
//! model.params.load = LoadCase::ForceControl {
//!     h_force: 800.0,
//!     v_force: 0.0,
//!     moment: 0.0,
//! };
//!
//! let result = model.rebuild_and_analyze().unwrap();
//! assert!(result.converged);
//!
//! let head_disp = *result.piles[0].displacement.last().unwrap();
//! assert!(head_disp > 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod file;
pub mod loads;
pub mod math;
pub mod mesh;
pub mod model;
pub mod params;
pub mod results;
pub mod soil;
pub mod solver;
pub mod springs;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::PileGroupModel;
    pub use crate::error::{PileError, PileResult};
    pub use crate::file::{load_model, save_model, Preferences};
    pub use crate::loads::LoadCase;
    pub use crate::params::{
        FeaParameters, Pile, PileGroupParameters, ViewOptions, MAX_PILES,
    };
    pub use crate::results::{AnalysisResult, Diagnostic, Extremes, PileSeries};
    pub use crate::soil::{SoilLayer, SoilProfile, GAMMA_WATER};
    pub use crate::solver::{AnalysisOptions, SolveState, StaticSolver};
    pub use crate::springs::{
        py_curve, qz_curve, tz_curve, GwtState, PultMethod, SpringCurve, SubgradeMethod,
    };
}
