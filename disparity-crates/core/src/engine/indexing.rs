//! The flat index spaces of the engine. All of them are row-major: the pixel index is
//! `y * width + x`, every pixel owns `disparity_levels` consecutive node indices and
//! [`Direction::COUNT`] consecutive neighbourhood indices, and every node owns
//! [`Direction::COUNT`] consecutive reparametrization indices.
//!
//! Devices receive the state as flat buffers in exactly this layout.
use crate::basic_types::Direction;
use crate::basic_types::Node;
use crate::basic_types::Pixel;
use crate::containers::StorageKey;
use crate::disparity_assert_moderate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelIndex(usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl StorageKey for PixelIndex {
    fn index(&self) -> usize {
        self.0
    }

    fn create_from_index(index: usize) -> Self {
        PixelIndex(index)
    }
}

impl StorageKey for NodeIndex {
    fn index(&self) -> usize {
        self.0
    }

    fn create_from_index(index: usize) -> Self {
        NodeIndex(index)
    }
}

/// Maps pixels, nodes and (pixel, direction) pairs of one grid to their flat indices and back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndexing {
    width: usize,
    height: usize,
    disparity_levels: usize,
}

impl GridIndexing {
    pub fn new(width: usize, height: usize, disparity_levels: usize) -> Self {
        GridIndexing {
            width,
            height,
            disparity_levels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn disparity_levels(&self) -> usize {
        self.disparity_levels
    }

    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn num_nodes(&self) -> usize {
        self.num_pixels() * self.disparity_levels
    }

    pub fn num_neighborhoods(&self) -> usize {
        self.num_pixels() * Direction::COUNT
    }

    pub fn num_reparametrizations(&self) -> usize {
        self.num_nodes() * Direction::COUNT
    }

    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.x < self.width && pixel.y < self.height
    }

    pub fn pixel_index(&self, pixel: Pixel) -> PixelIndex {
        disparity_assert_moderate!(self.contains(pixel), "pixel {pixel} is out of bounds");
        PixelIndex(pixel.y * self.width + pixel.x)
    }

    pub fn pixel_from_index(&self, index: PixelIndex) -> Pixel {
        Pixel::new(index.0 % self.width, index.0 / self.width)
    }

    pub fn node_index(&self, node: Node) -> NodeIndex {
        disparity_assert_moderate!(node.disparity < self.disparity_levels);
        NodeIndex(self.pixel_index(node.pixel).0 * self.disparity_levels + node.disparity)
    }

    pub fn node_from_index(&self, index: NodeIndex) -> Node {
        let pixel = self.pixel_from_index(PixelIndex(index.0 / self.disparity_levels));
        Node::new(pixel, index.0 % self.disparity_levels)
    }

    /// The node indices of all disparities of `pixel`; they are consecutive.
    pub fn node_indices_of(&self, pixel: Pixel) -> impl Iterator<Item = NodeIndex> {
        let first = self.pixel_index(pixel).0 * self.disparity_levels;
        (first..first + self.disparity_levels).map(NodeIndex)
    }

    pub fn neighborhood_index(&self, pixel: Pixel, direction: Direction) -> usize {
        self.pixel_index(pixel).0 * Direction::COUNT + direction.index()
    }

    pub fn reparametrization_index(&self, node: Node, direction: Direction) -> usize {
        self.node_index(node).0 * Direction::COUNT + direction.index()
    }

    /// The in-bounds 4-neighbour of `pixel` in `direction`.
    pub fn neighbor(&self, pixel: Pixel, direction: Direction) -> Option<Pixel> {
        direction
            .neighbor_of(pixel)
            .filter(|&neighbor| self.contains(neighbor))
    }

    /// Whether `pixel` lies in the grid and has a neighbour in `direction`.
    pub fn neighborhood_exists(&self, pixel: Pixel, direction: Direction) -> bool {
        self.contains(pixel) && self.neighbor(pixel, direction).is_some()
    }
}
