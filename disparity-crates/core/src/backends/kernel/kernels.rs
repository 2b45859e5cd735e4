//! The bodies of the kernels run by the [`HostDevice`](super::HostDevice).
//!
//! A kernel only sees flat buffers, so the problem is described by [`KernelProblem`] in terms of
//! raw indices. The layout is the one of [`GridIndexing`](crate::engine::GridIndexing): pixels
//! are in row-major order, the nodes of a pixel are contiguous and every node or pixel has one
//! entry per direction in the order right, left, bottom, top.
//!
//! The penalties are evaluated with the same sequence of floating point operations as
//! [`DisparityGraph`](crate::engine::DisparityGraph), which keeps the kernels in exact agreement
//! with the host backends.

use crate::disparity_assert_moderate;

pub(crate) const CSP_ITERATION: &str = "csp_iteration";
pub(crate) const CHOOSE_BEST_NODE: &str = "choose_best_node_gpu";

/// `availability, changed` followed by the problem arguments.
pub(crate) const CSP_ITERATION_ARITY: usize = 2 + PROBLEM_ARITY;
/// `availability` followed by the problem arguments and the pixel coordinates.
pub(crate) const CHOOSE_BEST_NODE_ARITY: usize = 1 + PROBLEM_ARITY + 2;
/// `left, right, min_pixels, min_edges, reparametrization, height, width, max_value, levels,
/// threshold, cleanness, smoothness`.
pub(crate) const PROBLEM_ARITY: usize = 12;

const NUM_DIRECTIONS: usize = 4;
const RIGHT: usize = 0;
const LEFT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;

#[derive(Clone, Copy, Debug)]
pub(crate) struct KernelProblem<'b> {
    pub(super) left: &'b [i32],
    pub(super) right: &'b [i32],
    pub(super) min_pixels: &'b [f64],
    pub(super) min_edges: &'b [f64],
    pub(super) reparametrization: &'b [f64],
    pub(super) height: usize,
    pub(super) width: usize,
    pub(super) levels: usize,
    pub(super) threshold: f64,
    pub(super) cleanness: f64,
    pub(super) smoothness: f64,
}

impl KernelProblem<'_> {
    pub(crate) fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    pub(crate) fn num_nodes(&self) -> usize {
        self.num_pixels() * self.levels
    }

    fn pixel_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn node_index(&self, x: usize, y: usize, d: usize) -> usize {
        self.pixel_index(x, y) * self.levels + d
    }

    fn node_exists(&self, x: usize, y: usize, d: usize) -> bool {
        d < self.levels && x < self.width && y < self.height && x + d < self.width
    }

    fn neighbor(&self, x: usize, y: usize, direction: usize) -> Option<(usize, usize)> {
        let (nx, ny) = match direction {
            RIGHT => (x + 1, y),
            LEFT => (x.checked_sub(1)?, y),
            BOTTOM => (x, y + 1),
            TOP => (x, y.checked_sub(1)?),
            _ => return None,
        };

        (nx < self.width && ny < self.height).then_some((nx, ny))
    }

    fn reverse(direction: usize) -> usize {
        direction ^ 1
    }

    fn reparametrization_of(&self, node: usize) -> &[f64] {
        &self.reparametrization[node * NUM_DIRECTIONS..(node + 1) * NUM_DIRECTIONS]
    }

    fn node_penalty(&self, x: usize, y: usize, d: usize) -> f64 {
        let difference = f64::from(self.right[self.pixel_index(x, y)])
            - f64::from(self.left[self.pixel_index(x + d, y)]);
        let reparametrization: f64 = self
            .reparametrization_of(self.node_index(x, y, d))
            .iter()
            .sum();

        self.cleanness * difference * difference + reparametrization
    }

    fn edge_penalty(&self, x: usize, y: usize, d: usize, direction: usize, nd: usize) -> f64 {
        let Some((nx, ny)) = self.neighbor(x, y, direction) else {
            return f64::INFINITY;
        };

        let difference = d.abs_diff(nd) as f64;

        self.smoothness * difference * difference
            - self.reparametrization_of(self.node_index(x, y, d))[direction]
            - self.reparametrization_of(self.node_index(nx, ny, nd))[Self::reverse(direction)]
    }

    fn edge_exists(&self, x: usize, y: usize, d: usize, direction: usize, nd: usize) -> bool {
        let Some((nx, ny)) = self.neighbor(x, y, direction) else {
            return false;
        };
        if !self.node_exists(x, y, d) || !self.node_exists(nx, ny, nd) {
            return false;
        }

        match direction {
            RIGHT => d <= nd + 1,
            LEFT => d + 1 >= nd,
            _ => true,
        }
    }

    fn is_node_available(&self, availability: &[i32], x: usize, y: usize, d: usize) -> bool {
        self.node_exists(x, y, d) && availability[self.node_index(x, y, d)] != 0
    }

    fn is_edge_available(
        &self,
        availability: &[i32],
        (x, y, d): (usize, usize, usize),
        direction: usize,
        nd: usize,
    ) -> bool {
        let Some((nx, ny)) = self.neighbor(x, y, direction) else {
            return false;
        };

        self.edge_exists(x, y, d, direction, nd)
            && self.is_node_available(availability, x, y, d)
            && self.is_node_available(availability, nx, ny, nd)
            && self.edge_penalty(x, y, d, direction, nd)
                - self.min_edges[self.pixel_index(x, y) * NUM_DIRECTIONS + direction]
                <= self.threshold
    }

    fn should_remove_node(&self, availability: &[i32], x: usize, y: usize, d: usize) -> bool {
        if !self.is_node_available(availability, x, y, d) {
            return false;
        }

        (0..NUM_DIRECTIONS).any(|direction| {
            self.neighbor(x, y, direction).is_some()
                && !(0..self.levels).any(|nd| {
                    self.is_edge_available(availability, (x, y, d), direction, nd)
                })
        })
    }
}

/// One instance per node: remove the node if it has lost support and raise the `changed` flag.
pub(crate) fn csp_iteration(
    problem: &KernelProblem<'_>,
    availability: &mut [i32],
    changed: &mut [i32],
    global_id: usize,
) {
    if global_id >= problem.num_nodes() {
        return;
    }

    let d = global_id % problem.levels;
    let pixel = global_id / problem.levels;
    let (x, y) = (pixel % problem.width, pixel / problem.width);

    if problem.should_remove_node(availability, x, y, d) {
        availability[global_id] = 0;
        changed[0] = 1;
    }
}

/// A single instance: keep the first available node of the pixel with the lowest penalty and
/// remove the other nodes of the pixel.
pub(crate) fn choose_best_node(
    problem: &KernelProblem<'_>,
    availability: &mut [i32],
    x: usize,
    y: usize,
) {
    let best = (0..problem.levels)
        .filter(|&d| problem.is_node_available(availability, x, y, d))
        .fold(None, |best: Option<(usize, f64)>, d| {
            let penalty = problem.node_penalty(x, y, d);
            match best {
                Some((_, lowest)) if lowest <= penalty => best,
                _ => Some((d, penalty)),
            }
        });

    disparity_assert_moderate!(best.map_or(true, |(_, penalty)| {
        penalty >= problem.min_pixels[problem.pixel_index(x, y)]
    }));

    for d in 0..problem.levels {
        if problem.node_exists(x, y, d) && best.map(|(kept, _)| kept) != Some(d) {
            availability[problem.node_index(x, y, d)] = 0;
        }
    }
}
