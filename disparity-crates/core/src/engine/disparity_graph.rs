use enum_map::EnumMap;
use log::debug;

use super::indexing::GridIndexing;
use super::indexing::NodeIndex;
use crate::basic_types::Direction;
use crate::basic_types::Edge;
use crate::basic_types::GraphConstructionError;
use crate::basic_types::Image;
use crate::basic_types::Node;
use crate::basic_types::Pixel;
use crate::containers::KeyedVec;
use crate::disparity_assert_moderate;

/// Weights below this value are considered to be zero.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// The energy model of a stereo pair.
///
/// A node is a pixel of the right image together with a candidate disparity, and it is penalised
/// by how much the intensity of the pixel differs from the intensity of the matching pixel in the
/// left image. Edges connect nodes of 4-neighbouring pixels and are penalised by the squared
/// difference of their disparities.
///
/// On top of the plain penalties the graph keeps a reparametrization: one value per node and
/// direction which is added to the node penalty and subtracted from the penalty of every edge
/// leaving the node in that direction. It shifts penalty between nodes and edges without changing
/// which nodes and edges exist.
#[derive(Debug, Clone)]
pub struct DisparityGraph {
    left: Image,
    right: Image,
    indexing: GridIndexing,
    cleanness: f64,
    smoothness: f64,
    reparametrization: KeyedVec<NodeIndex, EnumMap<Direction, f64>>,
}

impl DisparityGraph {
    /// Build the energy model of the pair `left`/`right`.
    ///
    /// Both images have to be valid (see [`Image::is_valid`]) and of the same shape and maximal
    /// intensity, `disparity_levels` has to lie in `2..=width`, and the weights have to be finite,
    /// non-negative and not both zero.
    pub fn new(
        left: Image,
        right: Image,
        disparity_levels: usize,
        cleanness: f64,
        smoothness: f64,
    ) -> Result<DisparityGraph, GraphConstructionError> {
        if !left.is_valid() {
            return Err(GraphConstructionError::InvalidLeftImage);
        }
        if !right.is_valid() {
            return Err(GraphConstructionError::InvalidRightImage);
        }
        if disparity_levels <= 1 {
            return Err(GraphConstructionError::TooFewDisparityLevels(
                disparity_levels,
            ));
        }
        if disparity_levels > left.width() {
            return Err(GraphConstructionError::TooManyDisparityLevels {
                levels: disparity_levels,
                width: left.width(),
            });
        }
        if left.width() != right.width() {
            return Err(GraphConstructionError::WidthMismatch {
                left: left.width(),
                right: right.width(),
            });
        }
        if left.height() != right.height() {
            return Err(GraphConstructionError::HeightMismatch {
                left: left.height(),
                right: right.height(),
            });
        }
        if left.max_value() != right.max_value() {
            return Err(GraphConstructionError::MaxValueMismatch {
                left: left.max_value(),
                right: right.max_value(),
            });
        }
        for (name, value) in [("cleanness", cleanness), ("smoothness", smoothness)] {
            if !value.is_finite() || value < 0.0 {
                return Err(GraphConstructionError::InvalidWeight { name, value });
            }
        }
        if cleanness < WEIGHT_EPSILON && smoothness < WEIGHT_EPSILON {
            return Err(GraphConstructionError::NoPositiveWeight);
        }

        let indexing = GridIndexing::new(right.width(), right.height(), disparity_levels);
        debug!(
            "Built a disparity graph of {}x{} pixels with {} disparity levels",
            indexing.width(),
            indexing.height(),
            disparity_levels
        );

        Ok(DisparityGraph {
            left,
            right,
            indexing,
            cleanness,
            smoothness,
            reparametrization: KeyedVec::from_fn(indexing.num_nodes(), |_| EnumMap::default()),
        })
    }

    pub fn left(&self) -> &Image {
        &self.left
    }

    pub fn right(&self) -> &Image {
        &self.right
    }

    pub fn indexing(&self) -> &GridIndexing {
        &self.indexing
    }

    pub fn width(&self) -> usize {
        self.indexing.width()
    }

    pub fn height(&self) -> usize {
        self.indexing.height()
    }

    pub fn disparity_levels(&self) -> usize {
        self.indexing.disparity_levels()
    }

    pub fn cleanness(&self) -> f64 {
        self.cleanness
    }

    pub fn smoothness(&self) -> f64 {
        self.smoothness
    }

    /// The pixels of the grid in raster order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.right.pixels()
    }

    /// The existing nodes of `pixel` in ascending disparity.
    pub fn nodes_of(&self, pixel: Pixel) -> impl Iterator<Item = Node> + '_ {
        (0..self.disparity_levels())
            .map(move |disparity| Node::new(pixel, disparity))
            .take_while(move |&node| self.node_exists(node))
    }

    /// The directions in which `pixel` has a neighbour, together with that neighbour.
    pub fn neighbors(&self, pixel: Pixel) -> impl Iterator<Item = (Direction, Pixel)> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            self.indexing
                .neighbor(pixel, direction)
                .map(|neighbor| (direction, neighbor))
        })
    }

    pub fn node_exists(&self, node: Node) -> bool {
        node.disparity < self.disparity_levels()
            && self.right.contains(node.pixel)
            && node.pixel.x + node.disparity < self.left.width()
    }

    pub fn neighborhood_exists(&self, pixel: Pixel, direction: Direction) -> bool {
        self.indexing.neighborhood_exists(pixel, direction)
    }

    /// An edge exists when both of its nodes exist, their pixels are 4-neighbours and, for
    /// horizontal neighbours, the disparity does not drop by more than one step from a pixel to
    /// the pixel on its right.
    pub fn edge_exists(&self, edge: Edge) -> bool {
        if !self.node_exists(edge.node) || !self.node_exists(edge.neighbor) {
            return false;
        }

        match edge.direction() {
            Some(Direction::Right) => edge.node.disparity <= edge.neighbor.disparity + 1,
            Some(Direction::Left) => edge.node.disparity + 1 >= edge.neighbor.disparity,
            Some(Direction::Bottom) | Some(Direction::Top) => true,
            None => false,
        }
    }

    /// The penalty of `node`: the weighted squared intensity difference of the matched pixels plus
    /// the reparametrization of the node in every direction.
    ///
    /// Only meaningful for existing nodes.
    pub fn node_penalty(&self, node: Node) -> f64 {
        disparity_assert_moderate!(self.node_exists(node), "node {node} does not exist");

        let matched = Pixel::new(node.pixel.x + node.disparity, node.pixel.y);
        let difference =
            f64::from(self.right.value(node.pixel)) - f64::from(self.left.value(matched));

        let reparametrization: f64 = self.reparametrization[self.indexing.node_index(node)]
            .values()
            .sum();

        self.cleanness * difference * difference + reparametrization
    }

    /// The penalty of `edge`: the weighted squared disparity difference minus the
    /// reparametrization of both nodes towards each other.
    ///
    /// Returns infinity when the nodes are not 4-neighbours. Only meaningful for existing edges.
    pub fn edge_penalty(&self, edge: Edge) -> f64 {
        let Some(direction) = edge.direction() else {
            return f64::INFINITY;
        };

        let difference = edge.node.disparity.abs_diff(edge.neighbor.disparity) as f64;

        self.smoothness * difference * difference
            - self.reparametrization(edge.node, direction)
            - self.reparametrization(edge.neighbor, direction.reverse())
    }

    pub fn reparametrization(&self, node: Node, direction: Direction) -> f64 {
        self.reparametrization[self.indexing.node_index(node)][direction]
    }

    pub fn set_reparametrization(&mut self, node: Node, direction: Direction, value: f64) {
        let index = self.indexing.node_index(node);
        self.reparametrization[index][direction] = value;
    }

    /// The reparametrization flattened in the order of
    /// [`GridIndexing::reparametrization_index`].
    pub fn reparametrization_buffer(&self) -> Vec<f64> {
        self.reparametrization
            .iter()
            .flat_map(|values| values.values().copied())
            .collect()
    }
}
