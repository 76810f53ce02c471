//! Nonlinear static solver
//!
//! Pipeline: reverse Cuthill-McKee node numbering, penalty enforcement of
//! single- and multi-point constraints, symmetric banded direct solves,
//! full Newton-Raphson equilibrium iteration under incremental load
//! control. The load pattern is scaled linearly to 1.0 over the configured
//! number of steps; each step iterates until the displacement-increment
//! norm drops below tolerance.

use log::debug;
use nalgebra::DVector;

use crate::error::{PileError, PileResult};
use crate::math::{rcm_ordering, BandMatrix};
use crate::model::StructuralModel;

/// Solver configuration
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// Number of equal load increments to full load
    pub load_steps: usize,
    /// Convergence tolerance on the displacement-increment norm
    pub tolerance: f64,
    /// Maximum Newton-Raphson iterations per load step
    pub max_iterations: usize,
    /// Penalty stiffness for constraint enforcement
    pub penalty: f64,
}

impl AnalysisOptions {
    pub fn with_load_steps(mut self, steps: usize) -> Self {
        self.load_steps = steps;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            load_steps: 20,
            tolerance: 1.0e-3,
            max_iterations: 20,
            penalty: 1.0e14,
        }
    }
}

/// Solver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Idle,
    Assembled,
    Converged,
    Failed,
}

/// Nonlinear static solver over a [`StructuralModel`]
#[derive(Debug)]
pub struct StaticSolver {
    options: AnalysisOptions,
    state: SolveState,
}

impl StaticSolver {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            state: SolveState::Idle,
        }
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    /// Solve for the full load. On success the displacement state is
    /// stored in the model; on non-convergence the solve is abandoned and
    /// no results are left behind.
    pub fn analyze(&mut self, model: &mut StructuralModel) -> PileResult<()> {
        model.clear_solution();
        self.state = SolveState::Idle;

        let numbering = Numbering::build(model);
        debug!(
            "numbered {} dofs, half-bandwidth {}",
            numbering.n_dof, numbering.half_bandwidth
        );

        // beams are linear: their global stiffness never changes
        let beam_k: Vec<_> = model
            .beams
            .iter()
            .map(|b| model.beam_global_stiffness(b))
            .collect();

        let mut u = DVector::zeros(numbering.n_dof);
        self.state = SolveState::Assembled;

        let steps = self.options.load_steps.max(1);
        for step in 1..=steps {
            let lambda = step as f64 / steps as f64;
            let mut converged = false;

            for iteration in 1..=self.options.max_iterations {
                let (k, r) = self.assemble(model, &numbering, &beam_k, &u, lambda);
                let du = k.solve(&r).ok_or(PileError::SingularMatrix)?;
                u += &du;

                let norm = du.norm();
                debug!(
                    "step {step} (lambda {lambda:.2}) iteration {iteration}: |du| = {norm:.3e}"
                );
                if norm < self.options.tolerance {
                    converged = true;
                    break;
                }
            }

            if !converged {
                self.state = SolveState::Failed;
                return Err(PileError::NotConverged {
                    step,
                    iterations: self.options.max_iterations,
                });
            }
        }

        self.state = SolveState::Converged;
        model.set_solution(numbering.dof_start, u);
        Ok(())
    }

    /// Assemble the tangent stiffness and the out-of-balance force vector
    /// at displacement state `u` and load factor `lambda`
    fn assemble(
        &self,
        model: &StructuralModel,
        numbering: &Numbering,
        beam_k: &[crate::math::Mat12],
        u: &DVector<f64>,
        lambda: f64,
    ) -> (BandMatrix, DVector<f64>) {
        let alpha = self.options.penalty;
        let mut k = BandMatrix::zeros(numbering.n_dof, numbering.half_bandwidth);
        let mut r = DVector::zeros(numbering.n_dof);

        // external loads
        for load in &model.loads {
            let start = numbering.dof_start[load.node.0];
            r[start] += lambda * load.fx;
            r[start + 2] += lambda * load.fz;
            if model.node(load.node).ndof == 6 {
                r[start + 4] += lambda * load.my;
            }
        }

        // beam elements
        for (beam, ke) in model.beams.iter().zip(beam_k) {
            let mut gdof = [0usize; 12];
            for d in 0..6 {
                gdof[d] = numbering.dof_start[beam.i.0] + d;
                gdof[6 + d] = numbering.dof_start[beam.j.0] + d;
            }
            // internal force K·u
            for (row, &gi) in gdof.iter().enumerate() {
                let mut f = 0.0;
                for (col, &gj) in gdof.iter().enumerate() {
                    f += ke[(row, col)] * u[gj];
                }
                r[gi] -= f;
            }
            // upper triangle once; BandMatrix stores symmetric pairs once
            for row in 0..12 {
                for col in row..12 {
                    let v = ke[(row, col)];
                    if v != 0.0 {
                        k.add(gdof[row], gdof[col], v);
                    }
                }
            }
        }

        // zero-length spring elements
        for spring in &model.springs {
            for &(dof, mat_idx) in &spring.components {
                let gi = numbering.dof_start[spring.i.0] + dof;
                let gj = numbering.dof_start[spring.j.0] + dof;
                let material = &model.materials[mat_idx];
                let elongation = u[gj] - u[gi];
                let force = material.force(elongation);
                let kt = material.tangent(elongation);
                r[gi] += force;
                r[gj] -= force;
                k.add(gi, gi, kt);
                k.add(gj, gj, kt);
                k.add(gi, gj, -kt);
            }
        }

        // single-point constraints: penalty drives the dof to lambda*value
        for fix in &model.fixes {
            let g = numbering.dof_start[fix.node.0] + fix.dof;
            k.add(g, g, alpha);
            r[g] += alpha * (lambda * fix.value - u[g]);
        }

        // identity multi-point constraints
        for tie in &model.ties {
            for &dof in &tie.dofs {
                let gr = numbering.dof_start[tie.retained.0] + dof;
                let gc = numbering.dof_start[tie.constrained.0] + dof;
                let gap = u[gr] - u[gc];
                k.add(gr, gr, alpha);
                k.add(gc, gc, alpha);
                k.add(gr, gc, -alpha);
                r[gr] -= alpha * gap;
                r[gc] += alpha * gap;
            }
        }

        (k, r)
    }
}

/// RCM node numbering and derived equation bookkeeping
struct Numbering {
    dof_start: Vec<usize>,
    n_dof: usize,
    half_bandwidth: usize,
}

impl Numbering {
    fn build(model: &StructuralModel) -> Self {
        let n_nodes = model.nodes.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n_nodes];
        let mut couple = |adjacency: &mut Vec<Vec<usize>>, a: usize, b: usize| {
            adjacency[a].push(b);
            adjacency[b].push(a);
        };
        for beam in &model.beams {
            couple(&mut adjacency, beam.i.0, beam.j.0);
        }
        for spring in &model.springs {
            couple(&mut adjacency, spring.i.0, spring.j.0);
        }
        for tie in &model.ties {
            couple(&mut adjacency, tie.retained.0, tie.constrained.0);
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        let order = rcm_ordering(&adjacency);
        let mut dof_start = vec![0usize; n_nodes];
        let mut next = 0;
        for &old in &order {
            dof_start[old] = next;
            next += model.nodes[old].ndof;
        }

        // half-bandwidth from the widest coupled node pair
        let mut hb = model.nodes.iter().map(|n| n.ndof - 1).max().unwrap_or(0);
        for (i, list) in adjacency.iter().enumerate() {
            for &j in list {
                let lo = dof_start[i].min(dof_start[j]);
                let hi = (dof_start[i] + model.nodes[i].ndof)
                    .max(dof_start[j] + model.nodes[j].ndof);
                hb = hb.max(hi - 1 - lo);
            }
        }

        Self {
            dof_start,
            n_dof: next,
            half_bandwidth: hb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{SpringKind, SpringMaterial};
    use crate::model::NodeKind;
    use crate::springs::SpringCurve;
    use approx::assert_relative_eq;

    #[test]
    fn test_nonlinear_spring_reaches_disp50_at_half_ult() {
        // a single p-y spring loaded to half its capacity must land at
        // exactly its characteristic displacement
        let mut model = StructuralModel::new();
        let anchor = model.add_node(NodeKind::SoilSpring { pile: 0 }, 0.0, 0.0, 3);
        let free = model.add_node(NodeKind::PileSpring { pile: 0 }, 0.0, 0.0, 3);
        for d in 0..3 {
            model.fix(anchor, d);
        }
        model.fix(free, 1);
        model.fix(free, 2);
        let mat = model.add_material(SpringMaterial::new(
            SpringKind::Py,
            SpringCurve {
                ult: 100.0,
                disp50: 0.01,
            },
        ));
        model.add_spring(anchor, free, vec![(0, mat)]);
        model.add_load(free, 50.0, 0.0, 0.0);

        let mut solver = StaticSolver::new(AnalysisOptions::default().with_tolerance(1e-9));
        solver.analyze(&mut model).unwrap();
        assert_eq!(solver.state(), SolveState::Converged);

        let ux = model.displacement(free, 0).unwrap();
        assert_relative_eq!(ux, 0.01, max_relative = 1e-6);
    }

    #[test]
    fn test_overload_does_not_converge() {
        // loading past the spring capacity has no equilibrium state
        let mut model = StructuralModel::new();
        let anchor = model.add_node(NodeKind::SoilSpring { pile: 0 }, 0.0, 0.0, 3);
        let free = model.add_node(NodeKind::PileSpring { pile: 0 }, 0.0, 0.0, 3);
        for d in 0..3 {
            model.fix(anchor, d);
        }
        model.fix(free, 1);
        model.fix(free, 2);
        let mat = model.add_material(SpringMaterial::new(
            SpringKind::Py,
            SpringCurve {
                ult: 100.0,
                disp50: 0.01,
            },
        ));
        model.add_spring(anchor, free, vec![(0, mat)]);
        model.add_load(free, 150.0, 0.0, 0.0);

        let mut solver = StaticSolver::new(AnalysisOptions::default());
        let err = solver.analyze(&mut model).unwrap_err();
        assert!(matches!(err, PileError::NotConverged { .. }));
        assert_eq!(solver.state(), SolveState::Failed);
        // no stale results are left behind
        assert!(model.displacement(free, 0).is_err());
    }

    #[test]
    fn test_prescribed_displacement_scales_with_load_factor() {
        // a penalty-enforced prescribed displacement reaches its full
        // value at the end of the staged loading
        let mut model = StructuralModel::new();
        let anchor = model.add_node(NodeKind::SoilSpring { pile: 0 }, 0.0, 0.0, 3);
        let free = model.add_node(NodeKind::PileSpring { pile: 0 }, 0.0, 0.0, 3);
        for d in 0..3 {
            model.fix(anchor, d);
        }
        model.fix(free, 1);
        model.fix(free, 2);
        let mat = model.add_material(SpringMaterial::new(
            SpringKind::Py,
            SpringCurve {
                ult: 100.0,
                disp50: 0.01,
            },
        ));
        model.add_spring(anchor, free, vec![(0, mat)]);
        model.fix_value(free, 0, 0.02);

        let mut solver = StaticSolver::new(AnalysisOptions::default().with_tolerance(1e-9));
        solver.analyze(&mut model).unwrap();
        let ux = model.displacement(free, 0).unwrap();
        assert_relative_eq!(ux, 0.02, max_relative = 1e-4);
    }
}
