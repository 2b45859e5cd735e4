use std::fmt::Display;
use std::fmt::Formatter;

use super::Direction;
use super::Pixel;

/// A candidate correspondence: `pixel` of the right image matches the pixel `disparity` columns
/// further in the left image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub pixel: Pixel,
    pub disparity: usize,
}

impl Node {
    pub fn new(pixel: Pixel, disparity: usize) -> Self {
        Node { pixel, disparity }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.pixel, self.disparity)
    }
}

/// An ordered pair of nodes.
///
/// Nothing prevents constructing an edge between nodes of pixels which are not adjacent; such an
/// edge simply does not exist in any graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub node: Node,
    pub neighbor: Node,
}

impl Edge {
    pub fn new(node: Node, neighbor: Node) -> Self {
        Edge { node, neighbor }
    }

    /// The direction of the neighbouring pixel as seen from the pixel of `node`.
    pub fn direction(&self) -> Option<Direction> {
        Direction::between(self.node.pixel, self.neighbor.pixel)
    }

    pub fn reversed(&self) -> Edge {
        Edge::new(self.neighbor, self.node)
    }
}
