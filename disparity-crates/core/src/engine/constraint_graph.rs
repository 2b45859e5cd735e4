use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use super::indexing::GridIndexing;
use super::indexing::NodeIndex;
use super::DisparityGraph;
use super::LowestPenalties;
use crate::basic_types::Edge;
use crate::basic_types::Node;
use crate::basic_types::Pixel;
use crate::containers::KeyedVec;
use crate::disparity_assert_moderate;

/// The constraint satisfaction problem induced by a [`DisparityGraph`] and a threshold.
///
/// Every node is either available or removed, and a removed node never becomes available again.
/// Edges are not stored; whether an edge is available is derived from its nodes whenever it is
/// asked for, which keeps the memory linear in the number of nodes.
///
/// The availability flags are atomics so that several workers can relax disjoint rows at the same
/// time. They are accessed with relaxed ordering: a worker may observe a removal in another row
/// late, which can postpone a removal to the next pass but never causes a supported node to be
/// removed, since the set of available nodes only shrinks.
#[derive(Debug)]
pub struct ConstraintGraph<'a> {
    disparity_graph: &'a DisparityGraph,
    lowest_penalties: &'a LowestPenalties,
    threshold: f64,
    nodes_availability: KeyedVec<NodeIndex, AtomicBool>,
}

impl<'a> ConstraintGraph<'a> {
    /// Seed the constraint graph: a node is available if its penalty is within `threshold` of the
    /// lowest penalty of its pixel.
    pub fn new(
        disparity_graph: &'a DisparityGraph,
        lowest_penalties: &'a LowestPenalties,
        threshold: f64,
    ) -> ConstraintGraph<'a> {
        let indexing = disparity_graph.indexing();
        let nodes_availability = KeyedVec::from_fn(indexing.num_nodes(), |index| {
            let node = indexing.node_from_index(index);
            let available = disparity_graph.node_exists(node)
                && disparity_graph.node_penalty(node) - lowest_penalties.pixel(node.pixel)
                    <= threshold;
            AtomicBool::new(available)
        });

        ConstraintGraph {
            disparity_graph,
            lowest_penalties,
            threshold,
            nodes_availability,
        }
    }

    pub fn disparity_graph(&self) -> &'a DisparityGraph {
        self.disparity_graph
    }

    pub fn lowest_penalties(&self) -> &'a LowestPenalties {
        self.lowest_penalties
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn indexing(&self) -> &GridIndexing {
        self.disparity_graph.indexing()
    }

    pub fn is_node_available(&self, node: Node) -> bool {
        self.disparity_graph.node_exists(node)
            && self.nodes_availability[self.indexing().node_index(node)].load(Ordering::Relaxed)
    }

    /// Mark `node` as removed.
    ///
    /// Takes a shared reference so that workers relaxing different rows can remove nodes
    /// concurrently.
    pub fn remove_node(&self, node: Node) {
        self.nodes_availability[self.indexing().node_index(node)].store(false, Ordering::Relaxed);
    }

    /// An edge is available if it exists, both of its nodes are available and its penalty is within
    /// the threshold of the lowest penalty of its neighbourhood.
    pub fn is_edge_available(&self, edge: Edge) -> bool {
        let Some(direction) = edge.direction() else {
            return false;
        };

        self.disparity_graph.edge_exists(edge)
            && self.is_node_available(edge.node)
            && self.is_node_available(edge.neighbor)
            && self.disparity_graph.edge_penalty(edge)
                - self.lowest_penalties.neighborhood(edge.node.pixel, direction)
                <= self.threshold
    }

    /// A node has to be removed if it is available but some neighbouring pixel has no available
    /// node connected to it by an available edge.
    pub fn should_remove_node(&self, node: Node) -> bool {
        if !self.is_node_available(node) {
            return false;
        }

        self.disparity_graph
            .neighbors(node.pixel)
            .any(|(_, neighbor)| !self.is_supported_by(node, neighbor))
    }

    fn is_supported_by(&self, node: Node, neighbor: Pixel) -> bool {
        self.disparity_graph
            .nodes_of(neighbor)
            .any(|neighbor_node| self.is_edge_available(Edge::new(node, neighbor_node)))
    }

    /// Remove every node in row `y` which has lost support, in a single pass from left to right.
    ///
    /// Returns the number of removed nodes.
    pub fn relax_row(&self, y: usize) -> usize {
        let mut removed = 0;
        for x in 0..self.disparity_graph.width() {
            for node in self.disparity_graph.nodes_of(Pixel::new(x, y)) {
                if self.should_remove_node(node) {
                    self.remove_node(node);
                    removed += 1;
                }
            }
        }
        removed
    }

    /// One pass of arc consistency over all rows.
    ///
    /// Returns the number of removed nodes.
    pub fn relaxation_iteration(&self) -> usize {
        (0..self.disparity_graph.height())
            .map(|y| self.relax_row(y))
            .sum()
    }

    /// The number of nodes a relaxation pass would remove, without removing them.
    ///
    /// Zero exactly when the graph is arc consistent.
    pub fn count_unsupported_nodes(&self) -> usize {
        self.available_nodes()
            .filter(|&node| self.should_remove_node(node))
            .count()
    }

    /// The available disparities of `pixel` in ascending order.
    pub fn available_disparities(&self, pixel: Pixel) -> impl Iterator<Item = usize> + '_ {
        self.disparity_graph
            .nodes_of(pixel)
            .filter(move |&node| self.is_node_available(node))
            .map(|node| node.disparity)
    }

    pub fn is_pixel_empty(&self, pixel: Pixel) -> bool {
        self.available_disparities(pixel).next().is_none()
    }

    pub fn has_empty_pixel(&self) -> bool {
        self.disparity_graph
            .pixels()
            .any(|pixel| self.is_pixel_empty(pixel))
    }

    /// All available nodes, pixel by pixel in raster order.
    pub fn available_nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.disparity_graph.pixels().flat_map(move |pixel| {
            self.disparity_graph
                .nodes_of(pixel)
                .filter(move |&node| self.is_node_available(node))
        })
    }

    pub fn count_available_nodes(&self) -> usize {
        self.available_nodes().count()
    }

    /// Remove every node; this is the state of an inconsistent problem.
    pub fn clear(&mut self) {
        for availability in self.nodes_availability.iter_mut() {
            *availability.get_mut() = false;
        }
    }

    /// The availability of every node in node index order.
    pub fn availability_buffer(&self) -> Vec<bool> {
        self.nodes_availability
            .iter()
            .map(|availability| availability.load(Ordering::Relaxed))
            .collect()
    }

    /// Overwrite the availability with `buffer`, which is in node index order.
    ///
    /// Removed nodes stay removed.
    pub(crate) fn set_availability(&mut self, buffer: &[bool]) {
        disparity_assert_moderate!(buffer.len() == self.nodes_availability.len());

        for (availability, &available) in self.nodes_availability.iter_mut().zip(buffer) {
            let availability = availability.get_mut();
            disparity_assert_moderate!(
                *availability || !available,
                "a removed node cannot become available"
            );
            *availability = *availability && available;
        }
    }
}
