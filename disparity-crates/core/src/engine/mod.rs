//! The energy model of a stereo pair and the constraint satisfaction problem derived from it.
mod constraint_graph;
mod disparity_graph;
mod indexing;
mod lowest_penalties;

pub use constraint_graph::ConstraintGraph;
pub use disparity_graph::DisparityGraph;
pub use disparity_graph::WEIGHT_EPSILON;
pub use indexing::GridIndexing;
pub use indexing::NodeIndex;
pub use indexing::PixelIndex;
pub use lowest_penalties::LowestPenalties;
