//! 3-D k-d tree over unit vectors on the celestial sphere.
//!
//! Nearest neighbours in chord distance are nearest neighbours in angle, so
//! sky matching can run on Cartesian unit vectors without any special
//! handling of the RA wrap or the poles.

use nalgebra::Vector3;

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split axis (0 = x, 1 = y, 2 = z)
    axis: usize,
}

/// Static k-d tree; built once, queried many times
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<Vector3<f64>>,
    root: Option<usize>,
}

impl KdTree {
    /// Build a balanced tree using median splits on cycling axes
    pub fn build(points: Vec<Vector3<f64>>) -> Self {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = Self::build_recursive(&points, &mut indices, 0, &mut nodes);
        Self {
            nodes,
            points,
            root,
        }
    }

    fn build_recursive(
        points: &[Vector3<f64>],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let axis = depth % 3;
        let median = indices.len() / 2;
        indices.select_nth_unstable_by(median, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx: indices[median],
            left: None,
            right: None,
            axis,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);
        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest point to `query` as `(index, squared distance)`.
    ///
    /// Among equidistant points the lowest index wins, so results do not
    /// depend on tree layout.
    pub fn nearest(&self, query: &Vector3<f64>) -> Option<(usize, f64)> {
        let root = self.root?;
        let mut best: Option<(usize, f64)> = None;
        self.nearest_recursive(root, query, &mut best);
        best
    }

    fn nearest_recursive(&self, node_idx: usize, query: &Vector3<f64>, best: &mut Option<(usize, f64)>) {
        let node = &self.nodes[node_idx];
        let point = &self.points[node.point_idx];

        let dist_sq = (point - query).norm_squared();
        let better = match *best {
            None => true,
            Some((idx, d)) => dist_sq < d || (dist_sq == d && node.point_idx < idx),
        };
        if better {
            *best = Some((node.point_idx, dist_sq));
        }

        let diff = query[node.axis] - point[node.axis];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(first_idx) = first {
            self.nearest_recursive(first_idx, query, best);
        }

        // Ties must still be visited to honour the lowest-index rule
        let diff_sq = diff * diff;
        if let Some(second_idx) = second {
            if best.map_or(true, |(_, d)| diff_sq <= d) {
                self.nearest_recursive(second_idx, query, best);
            }
        }
    }

    /// All points within `radius` of `query`, sorted by distance then index
    pub fn within_radius(&self, query: &Vector3<f64>, radius: f64) -> Vec<(usize, f64)> {
        let mut results = Vec::new();
        if let Some(root) = self.root {
            self.radius_recursive(root, query, radius * radius, &mut results);
        }
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        results
    }

    fn radius_recursive(
        &self,
        node_idx: usize,
        query: &Vector3<f64>,
        radius_sq: f64,
        results: &mut Vec<(usize, f64)>,
    ) {
        let node = &self.nodes[node_idx];
        let point = &self.points[node.point_idx];

        let dist_sq = (point - query).norm_squared();
        if dist_sq <= radius_sq {
            results.push((node.point_idx, dist_sq));
        }

        let diff = query[node.axis] - point[node.axis];
        let diff_sq = diff * diff;

        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near_idx) = near {
            self.radius_recursive(near_idx, query, radius_sq, results);
        }
        if let Some(far_idx) = far {
            if diff_sq <= radius_sq {
                self.radius_recursive(far_idx, query, radius_sq, results);
            }
        }
    }
}
