//! High-level analysis facade
//!
//! [`PileGroupModel`] owns the parameter set and the last analysis result.
//! Every call to [`PileGroupModel::rebuild_and_analyze`] meshes the group
//! from scratch, runs the nonlinear solve, and extracts the response
//! series, so edits to the parameters can never leak stale state into the
//! results.

use log::info;

use crate::error::PileResult;
use crate::mesh::{self, MeshLayout};
use crate::model::StructuralModel;
use crate::params::PileGroupParameters;
use crate::results::{AnalysisResult, Extremes, PileSeries};
use crate::solver::{AnalysisOptions, StaticSolver};

/// Pile group model: parameters in, response series out
#[derive(Debug, Default)]
pub struct PileGroupModel {
    pub params: PileGroupParameters,
    pub options: AnalysisOptions,
    result: Option<AnalysisResult>,
}

impl PileGroupModel {
    pub fn new(params: PileGroupParameters) -> Self {
        Self {
            params,
            options: AnalysisOptions::default(),
            result: None,
        }
    }

    /// Result of the last successful analysis, if any
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Mesh, solve, and extract. On a failed solve the previous result is
    /// replaced by an empty non-converged one and the error is returned,
    /// so callers can never read series from an abandoned solve.
    pub fn rebuild_and_analyze(&mut self) -> PileResult<&AnalysisResult> {
        self.result = None;

        let (mut model, layout) = mesh::build(&self.params)?;
        info!(
            "meshed {} piles: {} nodes, {} beams, {} springs",
            self.params.num_piles(),
            model.nodes.len(),
            model.beams.len(),
            model.springs.len()
        );

        let mut solver = StaticSolver::new(self.options);
        if let Err(err) = solver.analyze(&mut model) {
            self.result = Some(AnalysisResult {
                piles: Vec::new(),
                extremes: Extremes::default(),
                converged: false,
                diagnostics: layout.diagnostics,
            });
            return Err(err);
        }

        self.result = Some(extract(&model, &layout)?);
        Ok(self.result.as_ref().unwrap())
    }
}

/// Pull the response series out of a solved model
fn extract(model: &StructuralModel, layout: &MeshLayout) -> PileResult<AnalysisResult> {
    let mut extremes = Extremes::default();
    let mut piles = Vec::with_capacity(layout.pile_nodes.len());

    for (pile_idx, nodes) in layout.pile_nodes.iter().enumerate() {
        let mut series = PileSeries::default();

        for (i, &node) in nodes.iter().enumerate() {
            let z = layout.loc[pile_idx][i];
            let disp = model.displacement(node, 0)?;

            // shear and moment from the element below the node; the toe
            // node has none
            let (shear, moment) = if i == 0 {
                (0.0, 0.0)
            } else {
                let f = model.beam_global_force(layout.pile_beams[pile_idx][i - 1])?;
                (f[6], f[10])
            };

            let depth = -z;
            let stress = if depth <= 0.0 {
                0.0
            } else {
                let layer_idx = layout.soil.layer_at(depth);
                let top = layout.soil.layer(layer_idx)?.top_depth();
                layout.soil.effective_stress_in(layer_idx, depth - top)?
            };

            series.location.push(z);
            series.displacement.push(disp);
            series.shear.push(shear);
            series.moment.push(moment);
            series.stress.push(stress);
            series.pult.push(layout.pult[pile_idx][i]);
            series.y50.push(layout.y50[pile_idx][i]);

            extremes.min_displacement = extremes.min_displacement.min(disp);
            extremes.max_displacement = extremes.max_displacement.max(disp);
            extremes.min_shear = extremes.min_shear.min(shear);
            extremes.max_shear = extremes.max_shear.max(shear);
            extremes.min_moment = extremes.min_moment.min(moment);
            extremes.max_moment = extremes.max_moment.max(moment);
        }

        piles.push(series);
    }

    Ok(AnalysisResult {
        piles,
        extremes,
        converged: true,
        diagnostics: layout.diagnostics.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadCase;

    #[test]
    fn test_default_model_analyzes() {
        let mut model = PileGroupModel::default();
        let result = model.rebuild_and_analyze().unwrap();
        assert!(result.converged);
        assert_eq!(result.piles.len(), 1);
        let series = &result.piles[0];
        assert_eq!(series.location.len(), series.displacement.len());

        // the pile deflects in the load direction, most at the head
        let head = *series.displacement.last().unwrap();
        assert!(head > 0.0);
        assert!(result.extremes.max_displacement <= head + 1e-12);

        // no element below the toe node
        assert_eq!(series.moment[0], 0.0);
        let toe_disp = series.displacement[0].abs();
        assert!(toe_disp < head.abs());
    }

    #[test]
    fn test_results_cleared_on_parameter_change() {
        let mut model = PileGroupModel::default();
        model.rebuild_and_analyze().unwrap();
        assert!(model.result().is_some());

        // an impossible load leaves only a non-converged marker behind
        model.params.load = LoadCase::ForceControl {
            h_force: 1.0e9,
            v_force: 0.0,
            moment: 0.0,
        };
        assert!(model.rebuild_and_analyze().is_err());
        let result = model.result().unwrap();
        assert!(!result.converged);
        assert!(result.piles.is_empty());
    }

    #[test]
    fn test_stress_series_matches_profile() {
        let mut model = PileGroupModel::default();
        let result = model.rebuild_and_analyze().unwrap();
        let series = &result.piles[0];
        for (i, &z) in series.location.iter().enumerate() {
            if z >= 0.0 {
                assert_eq!(series.stress[i], 0.0);
            } else {
                assert!(series.stress[i] > 0.0);
            }
        }
        // stress grows with depth along the pile
        let first = series.stress[0];
        let shallow = series.stress[series.stress.len() / 2];
        assert!(first > shallow);
    }
}
