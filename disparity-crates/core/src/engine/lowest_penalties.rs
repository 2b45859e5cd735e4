use enum_map::EnumMap;

use super::indexing::GridIndexing;
use super::indexing::PixelIndex;
use super::DisparityGraph;
use crate::basic_types::Direction;
use crate::basic_types::Edge;
use crate::basic_types::Pixel;
use crate::containers::KeyedVec;

/// The minimal node penalty of every pixel and the minimal edge penalty of every neighbourhood of
/// a [`DisparityGraph`].
///
/// The minima are computed once; changing the reparametrization of the graph afterwards does not
/// update them. Neighbourhoods which leave the grid have an infinite minimum.
#[derive(Debug, Clone)]
pub struct LowestPenalties {
    indexing: GridIndexing,
    pixels: KeyedVec<PixelIndex, f64>,
    neighborhoods: KeyedVec<PixelIndex, EnumMap<Direction, f64>>,
}

impl LowestPenalties {
    pub fn new(graph: &DisparityGraph) -> LowestPenalties {
        let indexing = *graph.indexing();

        let pixels = KeyedVec::from_fn(indexing.num_pixels(), |index| {
            let pixel = indexing.pixel_from_index(index);
            graph
                .nodes_of(pixel)
                .map(|node| graph.node_penalty(node))
                .fold(f64::INFINITY, f64::min)
        });

        let neighborhoods = KeyedVec::from_fn(indexing.num_pixels(), |index| {
            let pixel = indexing.pixel_from_index(index);
            let mut minima = EnumMap::from_fn(|_| f64::INFINITY);
            for (direction, neighbor) in graph.neighbors(pixel) {
                minima[direction] = lowest_edge_penalty(graph, pixel, neighbor);
            }
            minima
        });

        LowestPenalties {
            indexing,
            pixels,
            neighborhoods,
        }
    }

    pub fn pixel(&self, pixel: Pixel) -> f64 {
        self.pixels[self.indexing.pixel_index(pixel)]
    }

    pub fn neighborhood(&self, pixel: Pixel, direction: Direction) -> f64 {
        self.neighborhoods[self.indexing.pixel_index(pixel)][direction]
    }

    /// The per-pixel minima in pixel index order.
    pub fn pixels_buffer(&self) -> Vec<f64> {
        self.pixels.as_slice().to_vec()
    }

    /// The per-neighbourhood minima in neighbourhood index order.
    pub fn neighborhoods_buffer(&self) -> Vec<f64> {
        self.neighborhoods
            .iter()
            .flat_map(|minima| minima.values().copied())
            .collect()
    }
}

fn lowest_edge_penalty(graph: &DisparityGraph, pixel: Pixel, neighbor: Pixel) -> f64 {
    graph
        .nodes_of(pixel)
        .flat_map(|node| {
            graph
                .nodes_of(neighbor)
                .map(move |neighbor_node| Edge::new(node, neighbor_node))
        })
        .filter(|&edge| graph.edge_exists(edge))
        .map(|edge| graph.edge_penalty(edge))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Image;
    use crate::basic_types::Node;
    use crate::containers::StorageKey;

    #[test]
    fn black_images_have_zero_minima() {
        let black = Image::new(3, 2, 1, vec![0; 6]).expect("valid image");
        let graph = DisparityGraph::new(black.clone(), black, 3, 1.0, 1.0).expect("valid graph");

        let penalties = LowestPenalties::new(&graph);

        for pixel in graph.pixels() {
            assert_eq!(0.0, penalties.pixel(pixel));
            for (direction, _) in graph.neighbors(pixel) {
                assert_eq!(0.0, penalties.neighborhood(pixel, direction));
            }
        }
    }

    #[test]
    fn pixel_minimum_is_over_existing_nodes() {
        let left = Image::new(3, 2, 10, vec![8, 7, 10, 0, 0, 0]).expect("valid image");
        let right = Image::new(3, 2, 10, vec![10, 0, 0, 0, 0, 0]).expect("valid image");
        let graph = DisparityGraph::new(left, right, 3, 1.0, 1.0).expect("valid graph");

        let penalties = LowestPenalties::new(&graph);

        assert_eq!(0.0, penalties.pixel(Pixel::new(0, 0)));
        assert_eq!(49.0, penalties.pixel(Pixel::new(1, 0)));
        assert_eq!(100.0, penalties.pixel(Pixel::new(2, 0)));
    }

    #[test]
    fn missing_neighbourhoods_are_infinite() {
        let black = Image::new(2, 1, 1, vec![0; 2]).expect("valid image");
        let graph = DisparityGraph::new(black.clone(), black, 2, 1.0, 1.0).expect("valid graph");

        let penalties = LowestPenalties::new(&graph);
        let pixel = Pixel::new(0, 0);

        assert_eq!(0.0, penalties.neighborhood(pixel, Direction::Right));
        assert_eq!(f64::INFINITY, penalties.neighborhood(pixel, Direction::Left));
        assert_eq!(f64::INFINITY, penalties.neighborhood(pixel, Direction::Top));
        assert_eq!(f64::INFINITY, penalties.neighborhood(pixel, Direction::Bottom));
    }

    #[test]
    fn minima_are_not_refreshed_after_reparametrization() {
        let black = Image::new(2, 1, 1, vec![0; 2]).expect("valid image");
        let mut graph =
            DisparityGraph::new(black.clone(), black, 2, 1.0, 1.0).expect("valid graph");
        let penalties = LowestPenalties::new(&graph);

        graph.set_reparametrization(Node::new(Pixel::new(0, 0), 0), Direction::Right, -5.0);

        assert_eq!(0.0, penalties.pixel(Pixel::new(0, 0)));
        assert_eq!(-5.0, LowestPenalties::new(&graph).pixel(Pixel::new(0, 0)));
    }

    #[test]
    fn buffers_follow_the_index_layout() {
        let left = Image::new(3, 2, 10, vec![8, 7, 10, 0, 0, 0]).expect("valid image");
        let right = Image::new(3, 2, 10, vec![10, 0, 0, 0, 0, 0]).expect("valid image");
        let graph = DisparityGraph::new(left, right, 2, 1.0, 1.0).expect("valid graph");
        let penalties = LowestPenalties::new(&graph);
        let indexing = graph.indexing();

        let pixels = penalties.pixels_buffer();
        let neighborhoods = penalties.neighborhoods_buffer();

        assert_eq!(indexing.num_pixels(), pixels.len());
        assert_eq!(indexing.num_neighborhoods(), neighborhoods.len());
        for pixel in graph.pixels() {
            assert_eq!(penalties.pixel(pixel), pixels[indexing.pixel_index(pixel).index()]);
            for direction in Direction::ALL {
                assert_eq!(
                    penalties.neighborhood(pixel, direction),
                    neighborhoods[indexing.neighborhood_index(pixel, direction)]
                );
            }
        }
    }
}
