use itertools::Itertools;
use log::debug;

use crate::backends::CspBackend;
use crate::basic_types::Direction;
use crate::basic_types::Edge;
use crate::basic_types::LabelingError;
use crate::basic_types::Pixel;
use crate::engine::ConstraintGraph;
use crate::engine::DisparityGraph;
use crate::engine::LowestPenalties;

/// The distinct penalties of the nodes of `pixel` above `minimal_penalty`, in ascending order.
pub fn fetch_pixel_available_penalties(
    graph: &DisparityGraph,
    pixel: Pixel,
    minimal_penalty: f64,
) -> Vec<f64> {
    sorted_unique(
        graph
            .nodes_of(pixel)
            .map(|node| graph.node_penalty(node) - minimal_penalty)
            .collect(),
    )
}

/// The distinct penalties of the existing edges between `pixel` and its neighbour in `direction`
/// above `minimal_penalty`, in ascending order.
///
/// Empty when the neighbour lies outside of the grid.
pub fn fetch_edge_available_penalties(
    graph: &DisparityGraph,
    pixel: Pixel,
    direction: Direction,
    minimal_penalty: f64,
) -> Vec<f64> {
    let Some(neighbor) = graph.indexing().neighbor(pixel, direction) else {
        return Vec::new();
    };

    sorted_unique(
        graph
            .nodes_of(pixel)
            .cartesian_product(graph.nodes_of(neighbor).collect::<Vec<_>>())
            .map(|(node, neighbor_node)| Edge::new(node, neighbor_node))
            .filter(|&edge| graph.edge_exists(edge))
            .map(|edge| graph.edge_penalty(edge) - minimal_penalty)
            .collect(),
    )
}

/// Every threshold at which the consistency of the constraint graph can change, in ascending
/// order and without duplicates.
///
/// A node becomes available exactly when the threshold reaches its distance to the lowest penalty
/// of its pixel, and the same holds for edges and neighbourhoods.
pub fn fetch_available_penalties(
    graph: &DisparityGraph,
    lowest_penalties: &LowestPenalties,
) -> Vec<f64> {
    let per_pixel = graph.pixels().flat_map(|pixel| {
        let node_penalties =
            fetch_pixel_available_penalties(graph, pixel, lowest_penalties.pixel(pixel));
        let edge_penalties = graph.neighbors(pixel).map(move |(direction, _)| {
            fetch_edge_available_penalties(
                graph,
                pixel,
                direction,
                lowest_penalties.neighborhood(pixel, direction),
            )
        });

        std::iter::once(node_penalties).chain(edge_penalties)
    });

    per_pixel
        .kmerge_by(|first, second| first < second)
        .dedup()
        .collect()
}

/// Binary search for the smallest of the `candidates` at which the constraint graph is
/// consistent.
///
/// Consistency is monotone in the threshold, so the probes only ever need a fresh constraint
/// graph at the middle of the remaining window. The largest candidate is assumed to be
/// consistent and is never probed.
pub fn calculate_minimal_consistent_threshold(
    graph: &DisparityGraph,
    lowest_penalties: &LowestPenalties,
    candidates: &[f64],
    backend: &mut dyn CspBackend,
) -> Result<f64, LabelingError> {
    if candidates.is_empty() {
        return Err(LabelingError::NoCandidateThresholds);
    }

    let mut start = 0;
    let mut end = candidates.len() - 1;
    while start < end {
        let middle = (start + end) / 2;
        let threshold = candidates[middle];

        let mut constraint_graph = ConstraintGraph::new(graph, lowest_penalties, threshold);
        let consistent = backend.solve_csp(&mut constraint_graph)?;
        debug!("Threshold {threshold} is consistent: {consistent}");

        if consistent {
            end = middle;
        } else {
            start = middle + 1;
        }
    }

    Ok(candidates[start])
}

fn sorted_unique(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_unstable_by(f64::total_cmp);
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::Sequential;
    use crate::basic_types::Image;

    fn graph(left: Vec<u32>, right: Vec<u32>, max_value: u32, levels: usize) -> DisparityGraph {
        let left = Image::new(3, 2, max_value, left).expect("valid image");
        let right = Image::new(3, 2, max_value, right).expect("valid image");
        DisparityGraph::new(left, right, levels, 1.0, 1.0).expect("valid graph")
    }

    #[test]
    fn black_images() {
        let graph = graph(vec![0; 6], vec![0; 6], 2, 2);
        let penalties = LowestPenalties::new(&graph);

        assert_eq!(
            vec![0.0],
            fetch_pixel_available_penalties(&graph, Pixel::new(0, 0), 0.0)
        );
        assert_eq!(
            vec![0.0, 1.0],
            fetch_edge_available_penalties(&graph, Pixel::new(0, 0), Direction::Bottom, 0.0)
        );

        let candidates = fetch_available_penalties(&graph, &penalties);
        assert_eq!(vec![0.0, 1.0], candidates);

        let threshold = calculate_minimal_consistent_threshold(
            &graph,
            &penalties,
            &candidates,
            &mut Sequential::new(),
        )
        .expect("candidates are not empty");
        assert_eq!(0.0, threshold);
    }

    #[test]
    fn equal_images() {
        let data = vec![0, 127, 256, 256, 127, 0];
        let graph = graph(data.clone(), data, 256, 3);
        let penalties = LowestPenalties::new(&graph);

        assert_eq!(
            vec![0.0, 129.0 * 129.0],
            fetch_pixel_available_penalties(&graph, Pixel::new(1, 0), 0.0)
        );
        assert_eq!(
            vec![0.0, 1.0, 4.0],
            fetch_edge_available_penalties(&graph, Pixel::new(0, 0), Direction::Bottom, 0.0)
        );

        let candidates = fetch_available_penalties(&graph, &penalties);
        assert_eq!(
            vec![0.0, 1.0, 4.0, 127.0 * 127.0, 129.0 * 129.0, 256.0 * 256.0],
            candidates
        );

        let threshold = calculate_minimal_consistent_threshold(
            &graph,
            &penalties,
            &candidates,
            &mut Sequential::new(),
        )
        .expect("candidates are not empty");
        assert_eq!(0.0, threshold);
    }

    #[test]
    fn minimal_threshold_of_distinct_images() {
        let graph = graph(vec![4, 5, 10, 0, 0, 0], vec![10, 7, 0, 0, 0, 0], 10, 3);
        let penalties = LowestPenalties::new(&graph);

        assert_eq!(
            vec![0.0, 25.0, 36.0],
            fetch_pixel_available_penalties(&graph, Pixel::new(0, 0), 0.0)
        );

        let candidates = fetch_available_penalties(&graph, &penalties);
        assert_eq!(vec![0.0, 1.0, 4.0, 5.0, 25.0, 36.0], candidates);

        let mut backend = Sequential::new();
        let threshold =
            calculate_minimal_consistent_threshold(&graph, &penalties, &candidates, &mut backend)
                .expect("candidates are not empty");
        assert_eq!(5.0, threshold);
        assert!(backend.statistics().csp_solves > 0);
    }

    #[test]
    fn edges_leaving_the_grid_have_no_penalties() {
        let graph = graph(vec![0; 6], vec![0; 6], 2, 2);

        assert!(
            fetch_edge_available_penalties(&graph, Pixel::new(0, 0), Direction::Top, 0.0)
                .is_empty()
        );
    }

    #[test]
    fn empty_candidates_are_rejected() {
        let graph = graph(vec![0; 6], vec![0; 6], 2, 2);
        let penalties = LowestPenalties::new(&graph);

        let result =
            calculate_minimal_consistent_threshold(&graph, &penalties, &[], &mut Sequential::new());

        assert!(matches!(result, Err(LabelingError::NoCandidateThresholds)));
    }
}
