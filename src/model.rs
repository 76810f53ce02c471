//! Owned structural model for one analysis run
//!
//! The model is a plain arena of typed nodes, constraints, elements, and
//! spring materials. It is built fresh by the mesh builder for every
//! analysis and discarded afterwards; nothing in it survives a parameter
//! change. Node identity is a typed handle into the arena, so pile, cap,
//! and spring nodes can never collide the way raw integer tag bands can.

use nalgebra::DVector;

use crate::elements::{ElasticSection, SpringMaterial};
use crate::error::{PileError, PileResult};
use crate::math::{beam_transformation, Mat12, Vec12};

/// Handle to a node in the model arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// What role a node plays in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Fixed far-field anchor of a soil spring pair
    SoilSpring { pile: usize },
    /// Pile-side node of a soil spring pair, tied to the beam node
    PileSpring { pile: usize },
    /// Pile beam-column node
    Pile { pile: usize },
    /// Pile cap node
    Cap { pile: usize },
}

/// A node with 3 (translations) or 6 (translations + rotations) DOFs
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub x: f64,
    pub z: f64,
    pub ndof: usize,
}

/// Single-point constraint: one DOF held at `value`, scaled by the load
/// factor during the incremental solve (zero for plain fixities)
#[derive(Debug, Clone)]
pub struct Fix {
    pub node: NodeId,
    pub dof: usize,
    pub value: f64,
}

/// Identity multi-point constraint tying the listed DOFs of two nodes
#[derive(Debug, Clone)]
pub struct Tie {
    pub retained: NodeId,
    pub constrained: NodeId,
    pub dofs: Vec<usize>,
}

/// Beam-column element between two 6-DOF nodes
#[derive(Debug, Clone)]
pub struct Beam {
    pub i: NodeId,
    pub j: NodeId,
    /// Index into the model's section table
    pub section: usize,
}

/// Zero-length element between two coincident 3-DOF nodes, carrying one
/// uniaxial material per listed global translational direction
#[derive(Debug, Clone)]
pub struct Spring {
    pub i: NodeId,
    pub j: NodeId,
    /// (global translation DOF, material index) pairs
    pub components: Vec<(usize, usize)>,
}

/// Nodal load in the analysis plane
#[derive(Debug, Clone)]
pub struct NodalLoad {
    pub node: NodeId,
    pub fx: f64,
    pub fz: f64,
    pub my: f64,
}

/// Reference vector for all beam transformations, matching the
/// orientation convention of the pile and cap elements
pub const BEAM_VECXZ: [f64; 3] = [0.0, -1.0, 0.0];

/// Structural model: arena of entities plus, after a successful solve,
/// the global displacement state
#[derive(Debug, Default)]
pub struct StructuralModel {
    pub nodes: Vec<Node>,
    pub fixes: Vec<Fix>,
    pub ties: Vec<Tie>,
    pub sections: Vec<ElasticSection>,
    pub materials: Vec<SpringMaterial>,
    pub beams: Vec<Beam>,
    pub springs: Vec<Spring>,
    pub loads: Vec<NodalLoad>,
    /// Node count the sizing pass predicted (pile + cap nodes)
    pub expected_node_count: usize,

    // solution state, populated by the solver
    dof_start: Vec<usize>,
    solution: Option<DVector<f64>>,
}

impl StructuralModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, kind: NodeKind, x: f64, z: f64, ndof: usize) -> NodeId {
        debug_assert!(ndof == 3 || ndof == 6);
        self.nodes.push(Node { kind, x, z, ndof });
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Fix a DOF at zero
    pub fn fix(&mut self, node: NodeId, dof: usize) {
        self.fix_value(node, dof, 0.0);
    }

    /// Prescribe a DOF value (scaled by the load factor during the solve)
    pub fn fix_value(&mut self, node: NodeId, dof: usize, value: f64) {
        debug_assert!(dof < self.nodes[node.0].ndof);
        self.fixes.push(Fix { node, dof, value });
    }

    pub fn tie(&mut self, retained: NodeId, constrained: NodeId, dofs: &[usize]) {
        self.ties.push(Tie {
            retained,
            constrained,
            dofs: dofs.to_vec(),
        });
    }

    pub fn add_section(&mut self, section: ElasticSection) -> usize {
        self.sections.push(section);
        self.sections.len() - 1
    }

    pub fn add_material(&mut self, material: SpringMaterial) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_beam(&mut self, i: NodeId, j: NodeId, section: usize) -> usize {
        self.beams.push(Beam { i, j, section });
        self.beams.len() - 1
    }

    pub fn add_spring(&mut self, i: NodeId, j: NodeId, components: Vec<(usize, usize)>) -> usize {
        self.springs.push(Spring { i, j, components });
        self.springs.len() - 1
    }

    pub fn add_load(&mut self, node: NodeId, fx: f64, fz: f64, my: f64) {
        self.loads.push(NodalLoad { node, fx, fz, my });
    }

    /// Count of pile and cap nodes, the quantity checked against
    /// [`Self::expected_node_count`]
    pub fn structural_node_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Pile { .. } | NodeKind::Cap { .. }))
            .count()
    }

    /// Node coordinates as a 3-vector in the global frame
    pub fn coords(&self, id: NodeId) -> [f64; 3] {
        let n = &self.nodes[id.0];
        [n.x, 0.0, n.z]
    }

    pub fn beam_length(&self, beam: &Beam) -> f64 {
        let a = self.coords(beam.i);
        let b = self.coords(beam.j);
        ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2) + (b[2] - a[2]).powi(2)).sqrt()
    }

    pub(crate) fn set_solution(&mut self, dof_start: Vec<usize>, u: DVector<f64>) {
        self.dof_start = dof_start;
        self.solution = Some(u);
    }

    pub(crate) fn clear_solution(&mut self) {
        self.dof_start.clear();
        self.solution = None;
    }

    /// Global equation index of a node DOF (valid once numbered)
    pub fn global_dof(&self, node: NodeId, dof: usize) -> usize {
        debug_assert!(dof < self.nodes[node.0].ndof);
        self.dof_start[node.0] + dof
    }

    /// Displacement of one node DOF from the last solve
    pub fn displacement(&self, node: NodeId, dof: usize) -> PileResult<f64> {
        let u = self.solution.as_ref().ok_or(PileError::NotAnalyzed)?;
        Ok(u[self.global_dof(node, dof)])
    }

    /// Global resisting force vector of a beam element from the last
    /// solve: Tᵀ · k_local · T · u_element
    pub fn beam_global_force(&self, beam_idx: usize) -> PileResult<Vec12> {
        let u = self.solution.as_ref().ok_or(PileError::NotAnalyzed)?;
        let beam = &self.beams[beam_idx];
        let t = self.beam_transform(beam);
        let k_local = self.sections[beam.section].local_stiffness(self.beam_length(beam));

        let mut u_e = Vec12::zeros();
        for d in 0..6 {
            u_e[d] = u[self.global_dof(beam.i, d)];
            u_e[6 + d] = u[self.global_dof(beam.j, d)];
        }

        Ok(t.transpose() * (k_local * (t * u_e)))
    }

    /// Global stiffness matrix of a beam element
    pub fn beam_global_stiffness(&self, beam: &Beam) -> Mat12 {
        let t = self.beam_transform(beam);
        let k_local = self.sections[beam.section].local_stiffness(self.beam_length(beam));
        t.transpose() * k_local * t
    }

    fn beam_transform(&self, beam: &Beam) -> Mat12 {
        beam_transformation(&self.coords(beam.i), &self.coords(beam.j), &BEAM_VECXZ)
    }
}
