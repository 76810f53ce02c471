//! Mathematical utilities: beam matrices, node numbering, banded solver

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;

/// 12x12 matrix for beam-column stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for beam-column forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// Compute the transformation matrix for a 3D beam-column element.
///
/// `vecxz` is a reference vector lying in the local x-z plane (the same
/// orientation convention as a linear 3D geometric transformation with a
/// user-supplied x-z vector): local y = vecxz × x, local z = x × y.
///
/// # Returns
/// 12x12 transformation matrix from global to local coordinates
pub fn beam_transformation(i_node: &[f64; 3], j_node: &[f64; 3], vecxz: &[f64; 3]) -> Mat12 {
    let dx = j_node[0] - i_node[0];
    let dy = j_node[1] - i_node[1];
    let dz = j_node[2] - i_node[2];

    let length = (dx * dx + dy * dy + dz * dz).sqrt();
    debug_assert!(length > 1e-10, "beam element has zero length");

    // direction cosines for local x-axis (along the element)
    let x = [dx / length, dy / length, dz / length];

    // y = vecxz cross x (normalized)
    let y_unnorm = [
        vecxz[1] * x[2] - vecxz[2] * x[1],
        vecxz[2] * x[0] - vecxz[0] * x[2],
        vecxz[0] * x[1] - vecxz[1] * x[0],
    ];
    let y_len = (y_unnorm[0].powi(2) + y_unnorm[1].powi(2) + y_unnorm[2].powi(2)).sqrt();
    debug_assert!(y_len > 1e-10, "reference vector parallel to element axis");
    let y = [y_unnorm[0] / y_len, y_unnorm[1] / y_len, y_unnorm[2] / y_len];

    // z = x cross y
    let z = [
        x[1] * y[2] - x[2] * y[1],
        x[2] * y[0] - x[0] * y[2],
        x[0] * y[1] - x[1] * y[0],
    ];

    let r = Mat3::new(
        x[0], x[1], x[2],
        y[0], y[1], y[2],
        z[0], z[1], z[2],
    );

    let mut t = Mat12::zeros();
    for block in 0..4 {
        let offset = block * 3;
        for row in 0..3 {
            for col in 0..3 {
                t[(offset + row, offset + col)] = r[(row, col)];
            }
        }
    }

    t
}

/// Compute the local stiffness matrix for a 3D beam-column element
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `a` - Cross-sectional area
/// * `iy` - Moment of inertia about local y-axis
/// * `iz` - Moment of inertia about local z-axis
/// * `j` - Torsional constant
/// * `length` - Element length
pub fn beam_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let gj_l = g * j / l;

    let eiy_l3 = e * iy / l3;
    let eiy_l2 = e * iy / l2;
    let eiy_l = e * iy / l;

    let eiz_l3 = e * iz / l3;
    let eiz_l2 = e * iz / l2;
    let eiz_l = e * iz / l;

    #[rustfmt::skip]
    let data = [
        // Row 0: axial at i
        ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,          -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,
        // Row 1: shear Fy at i
        0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           6.0*eiz_l2,   0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           6.0*eiz_l2,
        // Row 2: shear Fz at i
        0.0,       0.0,          12.0*eiy_l3,   0.0,    -6.0*eiy_l2,   0.0,          0.0,       0.0,          -12.0*eiy_l3,  0.0,    -6.0*eiy_l2,   0.0,
        // Row 3: torsion at i
        0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,          0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,
        // Row 4: moment My at i
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    4.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    2.0*eiy_l,     0.0,
        // Row 5: moment Mz at i
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           4.0*eiz_l,    0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           2.0*eiz_l,
        // Row 6: axial at j
        -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,          ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,
        // Row 7: shear Fy at j
        0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           -6.0*eiz_l2,  0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           -6.0*eiz_l2,
        // Row 8: shear Fz at j
        0.0,       0.0,          -12.0*eiy_l3,  0.0,    6.0*eiy_l2,    0.0,          0.0,       0.0,          12.0*eiy_l3,   0.0,    6.0*eiy_l2,    0.0,
        // Row 9: torsion at j
        0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,          0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,
        // Row 10: moment My at j
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    2.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    4.0*eiy_l,     0.0,
        // Row 11: moment Mz at j
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           2.0*eiz_l,    0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           4.0*eiz_l,
    ];

    Mat12::from_row_slice(&data)
}

/// Reverse Cuthill-McKee ordering for bandwidth reduction.
///
/// `adjacency[i]` lists the neighbors of node `i`. Returns the new node
/// order: `order[k]` is the old index of the node placed at position `k`.
pub fn rcm_ordering(adjacency: &[std::vec::Vec<usize>]) -> std::vec::Vec<usize> {
    let n = adjacency.len();
    let degree: std::vec::Vec<usize> = adjacency.iter().map(|a| a.len()).collect();
    let mut visited = vec![false; n];
    let mut order = std::vec::Vec::with_capacity(n);

    while order.len() < n {
        // lowest-degree unvisited node seeds the next component
        let start = (0..n)
            .filter(|&i| !visited[i])
            .min_by_key(|&i| degree[i])
            .unwrap();

        let mut queue = std::collections::VecDeque::new();
        queue.push_back(start);
        visited[start] = true;

        while let Some(node) = queue.pop_front() {
            order.push(node);
            let mut neighbors: std::vec::Vec<usize> = adjacency[node]
                .iter()
                .copied()
                .filter(|&m| !visited[m])
                .collect();
            neighbors.sort_by_key(|&m| degree[m]);
            for m in neighbors {
                visited[m] = true;
                queue.push_back(m);
            }
        }
    }

    order.reverse();
    order
}

/// Symmetric banded matrix stored by its lower triangle.
///
/// Entry (i, j) with i >= j and i - j <= half_bandwidth lives at
/// `data[i * (hb + 1) + (i - j)]`.
#[derive(Debug, Clone)]
pub struct BandMatrix {
    n: usize,
    hb: usize,
    data: std::vec::Vec<f64>,
}

impl BandMatrix {
    pub fn zeros(n: usize, half_bandwidth: usize) -> Self {
        Self {
            n,
            hb: half_bandwidth,
            data: vec![0.0; n * (half_bandwidth + 1)],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn half_bandwidth(&self) -> usize {
        self.hb
    }

    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i >= j && i - j <= self.hb);
        i * (self.hb + 1) + (i - j)
    }

    /// Add `value` at (i, j); symmetric entries are stored once
    #[inline]
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        let (i, j) = if i >= j { (i, j) } else { (j, i) };
        let idx = self.idx(i, j);
        self.data[idx] += value;
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.idx(i, j)]
    }

    /// Solve A x = b by in-place banded LDLᵀ factorization.
    /// Consumes the assembled matrix. Returns `None` when a pivot
    /// degenerates (singular or indefinite beyond tolerance).
    pub fn solve(mut self, b: &Vec) -> Option<Vec> {
        let n = self.n;
        let m = self.hb;

        // factorization: strictly-lower entries become L, diagonal becomes D
        for i in 0..n {
            let j0 = i.saturating_sub(m);
            for j in j0..i {
                let mut sum = self.get(i, j);
                let k0 = j0.max(j.saturating_sub(m));
                for k in k0..j {
                    sum -= self.get(i, k) * self.get(j, k) * self.get(k, k);
                }
                let d = self.get(j, j);
                let idx = self.idx(i, j);
                self.data[idx] = sum / d;
            }
            let mut d = self.get(i, i);
            for k in j0..i {
                let l_ik = self.get(i, k);
                d -= l_ik * l_ik * self.get(k, k);
            }
            if d.abs() < 1e-300 {
                return None;
            }
            let idx = self.idx(i, i);
            self.data[idx] = d;
        }

        // forward substitution: y = L⁻¹ b
        let mut x = b.clone();
        for i in 0..n {
            let j0 = i.saturating_sub(m);
            let mut sum = x[i];
            for j in j0..i {
                sum -= self.get(i, j) * x[j];
            }
            x[i] = sum;
        }

        // diagonal scaling
        for i in 0..n {
            x[i] /= self.get(i, i);
        }

        // back substitution: x = L⁻ᵀ z
        for i in (0..n).rev() {
            let j1 = (i + m + 1).min(n);
            let mut sum = x[i];
            for j in (i + 1)..j1 {
                sum -= self.get(j, i) * x[j];
            }
            x[i] = sum;
        }

        Some(x)
    }
}
