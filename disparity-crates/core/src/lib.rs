//! # Disparity core
//! Dense stereo matching phrased as an energy minimisation over a grid of pixels.
//!
//! Every pixel of the right image is matched with a pixel of the left image shifted by some
//! disparity. A [`DisparityGraph`] scores every candidate match (a *node*) by the squared
//! intensity difference and every pair of neighbouring candidates (an *edge*) by the squared
//! difference of their disparities.
//!
//! Instead of minimising the energy directly, the solver looks for the smallest threshold at which
//! the nodes and edges that are within the threshold of their local minimum still admit a
//! consistent labeling. For a given threshold, a [`ConstraintGraph`] removes unsupported nodes
//! until it reaches the arc-consistent fixed point. The search itself lives in [`labeling`], and
//! the strategies that drive a constraint graph to its fixed point live in [`backends`].
//!
//! # Example
//! ```rust
//! # use disparity_core::backends::Sequential;
//! # use disparity_core::labeling::find_disparity_map;
//! # use disparity_core::DisparityGraph;
//! # use disparity_core::Image;
//! let left = Image::new(3, 2, 10, vec![4, 5, 10, 0, 0, 0]).unwrap();
//! let right = Image::new(3, 2, 10, vec![10, 7, 0, 0, 0, 0]).unwrap();
//! let graph = DisparityGraph::new(left, right, 3, 1.0, 1.0).unwrap();
//!
//! let disparity_map = find_disparity_map(&graph, &mut Sequential::new()).unwrap();
//!
//! assert_eq!(5.0, disparity_map.threshold);
//! assert_eq!(2, disparity_map.image.data()[0]);
//! ```
pub mod asserts;
pub mod backends;
pub(crate) mod basic_types;
pub mod containers;
pub mod engine;
pub mod labeling;
pub mod statistics;

pub use convert_case;

pub use crate::basic_types::Direction;
pub use crate::basic_types::Edge;
pub use crate::basic_types::GraphConstructionError;
pub use crate::basic_types::Image;
pub use crate::basic_types::ImageError;
pub use crate::basic_types::LabelingError;
pub use crate::basic_types::Node;
pub use crate::basic_types::Pixel;
pub use crate::engine::ConstraintGraph;
pub use crate::engine::DisparityGraph;
pub use crate::engine::LowestPenalties;
