//! From a [`DisparityGraph`](crate::engine::DisparityGraph) to a disparity map: the search for
//! the minimal consistent threshold and the greedy labeling of a consistent constraint graph.
mod labeling_finder;
mod pipeline;
mod threshold_search;

pub use labeling_finder::build_disparity_map;
pub use labeling_finder::choose_best_node;
pub use pipeline::find_disparity_map;
pub use pipeline::DisparityMap;
pub use pipeline::LabelingStatistics;
pub use threshold_search::calculate_minimal_consistent_threshold;
pub use threshold_search::fetch_available_penalties;
pub use threshold_search::fetch_edge_available_penalties;
pub use threshold_search::fetch_pixel_available_penalties;
