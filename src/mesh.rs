//! Mesh generation for the pile group
//!
//! For each pile the builder first sizes the mesh (how many layers the
//! pile penetrates and how many elements each layer gets), then generates
//! nodes, beam elements, soil-spring pairs, and constraints from the toe
//! upward. Pile beam nodes inside the soil sit at element midpoints so
//! that every embedded node carries exactly one soil-spring pair with the
//! element length as its tributary length. After all piles, a stiff cap
//! chains the pile heads, sorted by offset.

use log::warn;

use crate::elements::{ElasticSection, SpringKind, SpringMaterial};
use crate::error::{PileError, PileResult};
use crate::loads::LoadCase;
use crate::model::{NodeId, NodeKind, StructuralModel};
use crate::params::PileGroupParameters;
use crate::results::Diagnostic;
use crate::soil::SoilProfile;
use crate::springs::{py_curve, qz_curve, tz_curve, GwtState, SpringCurve};

/// Free length below this threshold is treated as a pile flush with grade
const MIN_FREE_LENGTH: f64 = 1.0e-4;

/// Placeholder capacity/displacement recorded for nodes without a spring
const PLACEHOLDER_PULT: f64 = 0.001;
const PLACEHOLDER_Y50: f64 = 0.00001;

/// Index tables and per-node diagnostic arrays for one generated mesh
#[derive(Debug, Clone)]
pub struct MeshLayout {
    /// Soil profile actually meshed (last layer stretched to the deepest
    /// pile toe when the piles outrun the defined column)
    pub soil: SoilProfile,
    /// Cumulative layer-top depths; entry `n` is the soil column base
    pub depth_of_layer: Vec<f64>,
    /// Number of layers each pile penetrates
    pub penetrated_layers: Vec<usize>,
    /// Pile beam nodes per pile, bottom to top
    pub pile_nodes: Vec<Vec<NodeId>>,
    /// Beam element indices per pile, bottom to top
    pub pile_beams: Vec<Vec<usize>>,
    /// Head (topmost) pile node per pile
    pub head_nodes: Vec<NodeId>,
    /// Node where head loads or prescribed displacements act
    pub loaded_node: NodeId,
    /// Node elevation per pile node
    pub loc: Vec<Vec<f64>>,
    /// Ultimate lateral line resistance (nodal capacity over tributary
    /// length) per pile node
    pub pult: Vec<Vec<f64>>,
    /// Characteristic lateral displacement per pile node
    pub y50: Vec<Vec<f64>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the structural model and its layout tables from the parameters
pub fn build(params: &PileGroupParameters) -> PileResult<(StructuralModel, MeshLayout)> {
    let num_piles = params.num_piles();
    if num_piles == 0 {
        return Err(PileError::NoPiles);
    }

    let fea = params.fea.clamped();
    let l1 = params.free_length;

    // the deepest toe stretches the last layer so every pile is covered
    let mut soil = params.soil.clone();
    let max_l2 = params
        .piles()
        .iter()
        .map(|p| p.embedded_length)
        .fold(0.0, f64::max);
    if soil.base_depth() < max_l2 {
        let last = soil.len() - 1;
        let extra = max_l2 - soil.base_depth();
        let thickness = soil.layer(last)?.thickness() + extra;
        soil.set_thickness(last, thickness)?;
    }
    soil.recompute();

    let mut depth_of_layer = vec![0.0];
    for layer in soil.layers() {
        depth_of_layer.push(depth_of_layer.last().unwrap() + layer.thickness());
    }

    /* ******** sizing and adjustments ******** */

    let mut penetrated_layers = vec![0usize; num_piles];
    let mut elems_in_layer: Vec<Vec<usize>> = vec![Vec::new(); num_piles];
    let mut num_node_pile = vec![0usize; num_piles];

    for (pile_idx, pile) in params.piles().iter().enumerate() {
        let l2 = pile.embedded_length;
        num_node_pile[pile_idx] = 2; // toe plus surface node
        if l1 > MIN_FREE_LENGTH {
            num_node_pile[pile_idx] += fea.num_elements_in_air;
        }

        penetrated_layers[pile_idx] = soil.len();
        for layer_idx in 0..soil.len() {
            // penetration stops at the first interface at or below the toe
            if depth_of_layer[layer_idx] >= l2 {
                penetrated_layers[pile_idx] = layer_idx;
                break;
            }

            // a layer crossing the toe is meshed down to the toe only
            let mut thickness = soil.layer(layer_idx)?.thickness();
            if depth_of_layer[layer_idx + 1] > l2 {
                thickness = l2 - depth_of_layer[layer_idx];
            }

            let n = (thickness / pile.diameter).round() as usize;
            let n = n.clamp(fea.min_elements_per_layer, fea.max_elements_per_layer);
            elems_in_layer[pile_idx].push(n);
            num_node_pile[pile_idx] += n;
        }
    }

    // one cap node per pile on top of the per-pile counts
    let expected_node_count = num_piles + num_node_pile.iter().sum::<usize>();

    /* ******** build the finite element mesh ******** */

    let mut model = StructuralModel::new();
    model.expected_node_count = expected_node_count;
    let mut diagnostics = Vec::new();

    let mut pile_nodes: Vec<Vec<NodeId>> = vec![Vec::new(); num_piles];
    let mut pile_beams: Vec<Vec<usize>> = vec![Vec::new(); num_piles];
    let mut head_nodes: Vec<NodeId> = Vec::with_capacity(num_piles);
    let mut loc: Vec<Vec<f64>> = vec![Vec::new(); num_piles];
    let mut pult: Vec<Vec<f64>> = vec![Vec::new(); num_piles];
    let mut y50: Vec<Vec<f64>> = vec![Vec::new(); num_piles];

    // cap rigidities accumulate the stiffest pile
    let mut cap_ea = 0.0_f64;
    let mut cap_ei = 0.0_f64;
    let mut cap_gj = 0.0_f64;

    let base_depth = *depth_of_layer.last().unwrap();
    let interface1 = depth_of_layer[1.min(soil.len())];
    let interface2 = depth_of_layer[2.min(soil.len())];
    let soil_motion = matches!(params.load, LoadCase::SoilMotion { .. });

    for (pile_idx, pile) in params.piles().iter().enumerate() {
        let l2 = pile.embedded_length;
        let x = pile.x_offset;

        let section = ElasticSection::circular_pile(pile.diameter, pile.e_modulus);
        cap_ea = cap_ea.max(100.0 * section.e * section.a);
        cap_ei = cap_ei.max(100.0 * section.e * section.iz);
        cap_gj = cap_gj.max(10.0 * section.g * section.j);
        let section = model.add_section(section);

        /* embedded pile portion */

        let mut z = -l2;

        let toe = model.add_node(NodeKind::Pile { pile: pile_idx }, x, z, 6);
        fix_out_of_plane(&mut model, toe);
        pile_nodes[pile_idx].push(toe);
        loc[pile_idx].push(z);
        pult[pile_idx].push(PLACEHOLDER_PULT);
        y50[pile_idx].push(PLACEHOLDER_Y50);

        // toe bearing: a fixed anchor and a pile-side node tied to the toe
        // beam node vertically, so the q-z spring resists toe settlement
        if params.use_toe_resistance {
            let anchor = model.add_node(NodeKind::SoilSpring { pile: pile_idx }, x, z, 3);
            let toe_spring = model.add_node(NodeKind::PileSpring { pile: pile_idx }, x, z, 3);
            for d in 0..3 {
                model.fix(anchor, d);
            }
            model.fix(toe_spring, 0);
            model.fix(toe_spring, 1);
            model.tie(toe, toe_spring, &[2]);

            let bearing = penetrated_layers[pile_idx].saturating_sub(1);
            let layer = soil.layer(bearing)?;
            let curve = qz_curve(layer.phi(), pile.diameter, layer.bottom_stress(), layer.g_modulus());
            check_curve(
                &mut diagnostics,
                SpringKind::Qz,
                pile_idx,
                bearing,
                l2,
                layer.bottom_stress(),
                pile.diameter,
                0.0,
                &curve,
            );
            let mat = model.add_material(SpringMaterial::new(SpringKind::Qz, curve));
            model.add_spring(anchor, toe_spring, vec![(2, mat)]);
        }

        /* work the way up layer by layer */

        for layer_idx in (0..penetrated_layers[pile_idx]).rev() {
            let layer = soil.layer(layer_idx)?;
            let mut thickness = layer.thickness();
            if depth_of_layer[layer_idx + 1] > l2 {
                thickness = l2 - depth_of_layer[layer_idx];
            }
            let ele_size = thickness / elems_in_layer[pile_idx][layer_idx] as f64;

            z += 0.5 * ele_size;
            for _ in 0..elems_in_layer[pile_idx][layer_idx] {
                let depth = -z;
                let depth_in_layer = depth - depth_of_layer[layer_idx];
                let sig_v = layer.effective_stress(depth_in_layer);
                let gwt = if soil.gw_depth() > depth {
                    GwtState::Below
                } else {
                    GwtState::Above
                };

                let py = py_curve(
                    depth,
                    sig_v,
                    layer.phi(),
                    pile.diameter,
                    ele_size,
                    params.pult_method,
                    params.subgrade_method,
                    gwt,
                );
                check_curve(
                    &mut diagnostics,
                    SpringKind::Py,
                    pile_idx,
                    layer_idx,
                    depth,
                    sig_v,
                    pile.diameter,
                    ele_size,
                    &py,
                );
                let tz = tz_curve(layer.phi(), pile.diameter, sig_v, ele_size);
                check_curve(
                    &mut diagnostics,
                    SpringKind::Tz,
                    pile_idx,
                    layer_idx,
                    depth,
                    sig_v,
                    pile.diameter,
                    ele_size,
                    &tz,
                );

                // spring pair: a far-field anchor and a pile-side node
                // tied to the beam node in the two in-plane translations
                let anchor = model.add_node(NodeKind::SoilSpring { pile: pile_idx }, x, z, 3);
                if soil_motion {
                    let value =
                        params
                            .load
                            .soil_displacement(depth, interface1, interface2, base_depth);
                    model.fix_value(anchor, 0, value);
                } else {
                    model.fix(anchor, 0);
                }
                model.fix(anchor, 1);
                model.fix(anchor, 2);

                let spring_node =
                    model.add_node(NodeKind::PileSpring { pile: pile_idx }, x, z, 3);
                model.fix(spring_node, 1);
                model.fix(spring_node, 2);

                let pile_node = model.add_node(NodeKind::Pile { pile: pile_idx }, x, z, 6);
                fix_out_of_plane(&mut model, pile_node);
                model.tie(pile_node, spring_node, &[0, 2]);

                let py_mat = model.add_material(SpringMaterial::new(SpringKind::Py, py));
                let tz_mat = model.add_material(SpringMaterial::new(SpringKind::Tz, tz));
                model.add_spring(anchor, spring_node, vec![(0, py_mat), (2, tz_mat)]);

                pile_nodes[pile_idx].push(pile_node);
                loc[pile_idx].push(z);
                // nodal capacity scaled back to a line load for display
                pult[pile_idx].push(py.ult / ele_size);
                y50[pile_idx].push(py.disp50);

                z += ele_size;
            }
            // back to the layer interface
            z -= 0.5 * ele_size;
        }

        if z.abs() > 1.0e-2 {
            warn!("node generation for pile {pile_idx} reached the surface at z = {z}");
            diagnostics.push(Diagnostic::SurfaceMismatch { pile: pile_idx, z });
        }

        /* nodes above grade */

        let ele_size = if l1 > MIN_FREE_LENGTH {
            l1 / fea.num_elements_in_air as f64
        } else {
            999.99
        };
        z = 0.0;
        while z < l1 + 1.0e-6 {
            let node = model.add_node(NodeKind::Pile { pile: pile_idx }, x, z, 6);
            fix_out_of_plane(&mut model, node);
            pile_nodes[pile_idx].push(node);
            loc[pile_idx].push(z);
            pult[pile_idx].push(PLACEHOLDER_PULT);
            y50[pile_idx].push(PLACEHOLDER_Y50);
            z += ele_size;
        }

        head_nodes.push(*pile_nodes[pile_idx].last().unwrap());

        /* beam elements along the pile */

        for w in pile_nodes[pile_idx].windows(2) {
            let idx = model.add_beam(w[0], w[1], section);
            pile_beams[pile_idx].push(idx);
        }
    }

    /* *** construct the pile cap *** */

    let mut order: Vec<usize> = (0..num_piles).collect();
    order.sort_by(|&a, &b| {
        params.piles()[a]
            .x_offset
            .total_cmp(&params.piles()[b].x_offset)
    });

    let cap_section = model.add_section(ElasticSection::rigid_cap(cap_ea, cap_ei, cap_gj));
    let rigid_dofs: &[usize] = &[0, 1, 2, 3, 4, 5];
    // the non-rigid connection leaves the bending rotation free
    let pinned_dofs: &[usize] = &[0, 1, 2, 3, 5];

    let mut prev: Option<NodeId> = None;
    let mut last_cap = None;
    for &pile_idx in &order {
        let x = params.piles()[pile_idx].x_offset;
        let cap_node = model.add_node(NodeKind::Cap { pile: pile_idx }, x, l1, 6);
        let dofs = if params.rigid_cap_connection {
            rigid_dofs
        } else {
            pinned_dofs
        };
        model.tie(cap_node, head_nodes[pile_idx], dofs);

        if let Some(prev) = prev {
            model.add_beam(prev, cap_node, cap_section);
        }
        prev = Some(cap_node);
        last_cap = Some(cap_node);
    }

    if num_piles == 1 {
        // extra fixity against the singular torsion mode of a lone cap
        model.fix(last_cap.unwrap(), 4);
    }

    let loaded_node = head_nodes[order[0]];

    /* head loads */

    match params.load {
        LoadCase::ForceControl {
            h_force,
            v_force,
            moment,
        } => {
            model.add_load(loaded_node, h_force, v_force, moment);
        }
        LoadCase::Pushover { h_disp, v_disp } => {
            model.fix_value(loaded_node, 0, h_disp);
            model.fix_value(loaded_node, 2, v_disp);
        }
        // prescribed at the spring anchors during generation
        LoadCase::SoilMotion { .. } => {}
    }

    /* consistency check */

    let generated = model.structural_node_count();
    if generated != expected_node_count {
        warn!("mesh consistency: {generated} nodes generated but {expected_node_count} expected");
        diagnostics.push(Diagnostic::MeshCountMismatch {
            expected: expected_node_count,
            generated,
        });
    }

    let layout = MeshLayout {
        soil,
        depth_of_layer,
        penetrated_layers,
        pile_nodes,
        pile_beams,
        head_nodes,
        loaded_node,
        loc,
        pult,
        y50,
        diagnostics,
    };

    Ok((model, layout))
}

/// Pile beam nodes act in the x-z plane only
fn fix_out_of_plane(model: &mut StructuralModel, node: NodeId) {
    model.fix(node, 1);
    model.fix(node, 3);
    model.fix(node, 5);
}

#[allow(clippy::too_many_arguments)]
fn check_curve(
    diagnostics: &mut Vec<Diagnostic>,
    kind: SpringKind,
    pile: usize,
    layer: usize,
    depth: f64,
    sig_v: f64,
    diameter: f64,
    trib_length: f64,
    curve: &SpringCurve,
) {
    if !curve.is_physical() {
        let diagnostic = Diagnostic::NonPhysicalSpring {
            pile,
            layer,
            kind,
            depth,
            sig_v,
            diameter,
            trib_length,
            ult: curve.ult,
            disp50: curve.disp50,
        };
        warn!("{diagnostic}");
        diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PileGroupParameters;

    fn count_kind(model: &StructuralModel, f: impl Fn(&NodeKind) -> bool) -> usize {
        model.nodes.iter().filter(|n| f(&n.kind)).count()
    }

    #[test]
    fn test_node_count_formula() {
        let params = PileGroupParameters::default();
        let (model, layout) = build(&params).unwrap();
        // layers 3/3/4 m with a 1 m pile round to the 15-element minimum
        let expected_per_pile = 2 + 4 + 15 + 15 + 15;
        assert_eq!(layout.pile_nodes[0].len(), expected_per_pile);
        assert_eq!(model.structural_node_count(), expected_per_pile + 1);
        assert_eq!(model.expected_node_count, expected_per_pile + 1);
        assert!(layout.diagnostics.is_empty());
    }

    #[test]
    fn test_element_count_within_bounds() {
        let mut params = PileGroupParameters::default();
        // thin pile forces the upper clamp in the thick layer
        params.pile_mut(0).unwrap().diameter = 0.05;
        params.pile_mut(0).unwrap().embedded_length = 10.0;
        let (_, layout) = build(&params).unwrap();
        let fea = params.fea;
        // beams per pile = nodes - 1; all per-layer counts clamped
        let n_embedded = layout.pile_nodes[0].len() - 2 - fea.num_elements_in_air;
        assert!(n_embedded <= 3 * fea.max_elements_per_layer);
        assert!(n_embedded >= 3 * fea.min_elements_per_layer);
    }

    #[test]
    fn test_flush_pile_has_single_grade_node() {
        let mut params = PileGroupParameters::default();
        params.free_length = 0.0;
        let (model, layout) = build(&params).unwrap();
        let expected_per_pile = 2 + 15 + 15 + 15;
        assert_eq!(layout.pile_nodes[0].len(), expected_per_pile);
        assert_eq!(model.structural_node_count(), expected_per_pile + 1);
    }

    #[test]
    fn test_toe_resistance_topology_delta() {
        let mut params = PileGroupParameters::default();
        params.add_pile().unwrap();
        let (base_model, _) = build(&params).unwrap();
        params.use_toe_resistance = true;
        let (toe_model, _) = build(&params).unwrap();

        let n = params.num_piles();
        assert_eq!(toe_model.springs.len(), base_model.springs.len() + n);
        assert_eq!(toe_model.materials.len(), base_model.materials.len() + n);
        // one vertical tie couples each toe spring to its pile
        assert_eq!(toe_model.ties.len(), base_model.ties.len() + n);
        assert_eq!(toe_model.beams.len(), base_model.beams.len());
        assert_eq!(
            toe_model.structural_node_count(),
            base_model.structural_node_count()
        );
        // the two extra nodes per pile are spring nodes
        assert_eq!(toe_model.nodes.len(), base_model.nodes.len() + 2 * n);
    }

    #[test]
    fn test_toe_exactly_at_interface() {
        let mut params = PileGroupParameters::default();
        params.pile_mut(0).unwrap().embedded_length = 6.0; // layers 3 + 3
        let (model, layout) = build(&params).unwrap();
        assert_eq!(layout.penetrated_layers[0], 2);
        assert_eq!(model.structural_node_count(), model.expected_node_count);
        assert!(layout
            .diagnostics
            .iter()
            .all(|d| !matches!(d, Diagnostic::MeshCountMismatch { .. })));
    }

    #[test]
    fn test_pile_shorter_than_first_layer() {
        let mut params = PileGroupParameters::default();
        params.pile_mut(0).unwrap().embedded_length = 2.0;
        let (model, layout) = build(&params).unwrap();
        assert_eq!(layout.penetrated_layers[0], 1);
        assert_eq!(model.structural_node_count(), model.expected_node_count);
    }

    #[test]
    fn test_pile_longer_than_all_layers() {
        let mut params = PileGroupParameters::default();
        params.pile_mut(0).unwrap().embedded_length = 30.0;
        let (model, layout) = build(&params).unwrap();
        assert_eq!(layout.penetrated_layers[0], 3);
        // the last layer stretched from 4 m to reach the toe at 30 m
        assert!((layout.soil.layer(2).unwrap().thickness() - 24.0).abs() < 1e-9);
        assert!((layout.depth_of_layer[3] - 30.0).abs() < 1e-9);
        assert_eq!(model.structural_node_count(), model.expected_node_count);
    }

    #[test]
    fn test_piles_sorted_by_offset_for_cap_and_load() {
        let mut params = PileGroupParameters::default();
        params.add_pile().unwrap();
        // move the second pile to the left of the first
        params.pile_mut(1).unwrap().x_offset = -5.0;
        let (model, layout) = build(&params).unwrap();
        // the loaded node is the head of the leftmost pile
        assert_eq!(layout.loaded_node, layout.head_nodes[1]);
        // one cap beam chains the two sorted cap nodes
        let cap_nodes = count_kind(&model, |k| matches!(k, NodeKind::Cap { .. }));
        assert_eq!(cap_nodes, 2);
    }

    #[test]
    fn test_cap_connection_tie_dofs() {
        let mut params = PileGroupParameters::default();
        let (model, layout) = build(&params).unwrap();
        let tie = model
            .ties
            .iter()
            .find(|t| t.constrained == layout.head_nodes[0])
            .unwrap();
        assert_eq!(tie.dofs, vec![0, 1, 2, 3, 4, 5]);

        // the non-rigid connection releases the bending rotation
        params.rigid_cap_connection = false;
        let (model, layout) = build(&params).unwrap();
        let tie = model
            .ties
            .iter()
            .find(|t| t.constrained == layout.head_nodes[0])
            .unwrap();
        assert_eq!(tie.dofs, vec![0, 1, 2, 3, 5]);
    }

    #[test]
    fn test_single_pile_cap_torsion_fixed() {
        let params = PileGroupParameters::default();
        let (model, _) = build(&params).unwrap();
        let cap_id = model
            .nodes
            .iter()
            .position(|n| matches!(n.kind, NodeKind::Cap { .. }))
            .unwrap();
        assert!(model
            .fixes
            .iter()
            .any(|f| f.node.0 == cap_id && f.dof == 4));
    }

    #[test]
    fn test_soil_motion_prescribes_anchor_displacement() {
        let mut params = PileGroupParameters::default();
        params.load = LoadCase::SoilMotion {
            surface_disp: 0.1,
            pct12: 0.5,
            pct23: 0.25,
            pct_base: 0.0,
        };
        let (model, _) = build(&params).unwrap();
        // some anchors carry a nonzero prescribed horizontal value
        let anchors_with_motion = model
            .fixes
            .iter()
            .filter(|f| {
                f.dof == 0
                    && f.value != 0.0
                    && matches!(model.node(f.node).kind, NodeKind::SoilSpring { .. })
            })
            .count();
        assert!(anchors_with_motion > 0);
    }
}
