use log::debug;
use log::info;

use super::build_disparity_map;
use super::calculate_minimal_consistent_threshold;
use super::fetch_available_penalties;
use crate::backends::CspBackend;
use crate::basic_types::Image;
use crate::basic_types::LabelingError;
use crate::create_statistics_struct;
use crate::engine::ConstraintGraph;
use crate::engine::DisparityGraph;
use crate::engine::LowestPenalties;

create_statistics_struct!(
    /// How the disparity map was found.
    LabelingStatistics {
        /// The number of distinct thresholds at which the consistency can change
        candidate_thresholds: usize,
        /// The number of constraint graphs solved by the threshold search
        threshold_probes: u64,
        /// The number of pixels in the disparity map
        labeled_pixels: usize,
});

/// The result of [`find_disparity_map`].
#[derive(Clone, Debug)]
pub struct DisparityMap {
    pub image: Image,
    /// The smallest threshold at which the constraint graph is consistent.
    pub threshold: f64,
    pub statistics: LabelingStatistics,
}

/// Find a disparity map for `graph` at the smallest threshold which admits a consistent
/// labeling.
pub fn find_disparity_map(
    graph: &DisparityGraph,
    backend: &mut dyn CspBackend,
) -> Result<DisparityMap, LabelingError> {
    let lowest_penalties = LowestPenalties::new(graph);

    let candidates = fetch_available_penalties(graph, &lowest_penalties);
    debug!("Searching through {} candidate thresholds", candidates.len());

    let solves_before = backend.statistics().csp_solves;
    let threshold =
        calculate_minimal_consistent_threshold(graph, &lowest_penalties, &candidates, backend)?;
    let threshold_probes = backend.statistics().csp_solves - solves_before;
    info!("Minimal consistent threshold is {threshold}");

    let mut constraint_graph = ConstraintGraph::new(graph, &lowest_penalties, threshold);
    if !backend.solve_csp(&mut constraint_graph)? {
        return Err(LabelingError::InconsistentThreshold(threshold));
    }

    backend.find_labeling(&mut constraint_graph)?;
    let image = build_disparity_map(&constraint_graph)?;

    let statistics = LabelingStatistics {
        candidate_thresholds: candidates.len(),
        threshold_probes,
        labeled_pixels: image.data().len(),
    };

    Ok(DisparityMap {
        image,
        threshold,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::Sequential;
    use crate::basic_types::Pixel;

    #[test]
    fn disparity_map_of_distinct_images() {
        let left = Image::new(3, 2, 10, vec![4, 5, 10, 0, 0, 0]).expect("valid image");
        let right = Image::new(3, 2, 10, vec![10, 7, 0, 0, 0, 0]).expect("valid image");
        let graph = DisparityGraph::new(left, right, 3, 1.0, 1.0).expect("valid graph");

        let disparity_map =
            find_disparity_map(&graph, &mut Sequential::new()).expect("labeling exists");

        assert_eq!(5.0, disparity_map.threshold);
        assert_eq!(2, disparity_map.image.value(Pixel::new(0, 0)));
        assert_eq!(3, disparity_map.image.max_value());
        assert_eq!(6, disparity_map.statistics.candidate_thresholds);
        assert_eq!(6, disparity_map.statistics.labeled_pixels);
        assert!(disparity_map.statistics.threshold_probes > 0);
    }

    #[test]
    fn black_images_have_zero_disparity() {
        let black = Image::new(3, 2, 1, vec![0; 6]).expect("valid image");
        let graph = DisparityGraph::new(black.clone(), black, 2, 1.0, 1.0).expect("valid graph");

        let disparity_map =
            find_disparity_map(&graph, &mut Sequential::new()).expect("labeling exists");

        assert_eq!(0.0, disparity_map.threshold);
        assert_eq!(vec![0; 6], disparity_map.image.into_data());
    }
}
