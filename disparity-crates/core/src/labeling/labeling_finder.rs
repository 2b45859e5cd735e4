use crate::basic_types::Image;
use crate::basic_types::LabelingError;
use crate::basic_types::Node;
use crate::basic_types::Pixel;
use crate::disparity_assert_moderate;
use crate::engine::ConstraintGraph;

/// Fix `pixel` to its available node with the lowest penalty and remove its other nodes.
///
/// Ties are resolved towards the lowest disparity. The removals are not propagated; that is left
/// to the caller.
pub fn choose_best_node(graph: &ConstraintGraph<'_>, pixel: Pixel) -> Result<Node, LabelingError> {
    let disparity_graph = graph.disparity_graph();

    let best = graph
        .available_disparities(pixel)
        .map(|disparity| Node::new(pixel, disparity))
        .fold(None, |best: Option<(Node, f64)>, node| {
            let penalty = disparity_graph.node_penalty(node);
            match best {
                Some((_, lowest)) if lowest <= penalty => best,
                _ => Some((node, penalty)),
            }
        });
    let Some((best, _)) = best else {
        return Err(LabelingError::NoAvailableNode(pixel));
    };

    for node in disparity_graph.nodes_of(pixel) {
        if node != best {
            graph.remove_node(node);
        }
    }
    disparity_assert_moderate!(graph.available_disparities(pixel).count() == 1);

    Ok(best)
}

/// Read the labeling out of a graph in which every pixel has exactly one available node.
///
/// The disparity map has the dimensions of the left image and declares the number of disparity
/// levels as its maximal value.
pub fn build_disparity_map(graph: &ConstraintGraph<'_>) -> Result<Image, LabelingError> {
    let disparity_graph = graph.disparity_graph();

    let data = disparity_graph
        .pixels()
        .map(|pixel| {
            let mut disparities = graph.available_disparities(pixel);
            match (disparities.next(), disparities.next()) {
                (Some(disparity), None) => Ok(disparity as u32),
                (None, _) => Err(LabelingError::AmbiguousLabel { pixel, count: 0 }),
                (Some(_), Some(_)) => Err(LabelingError::AmbiguousLabel {
                    pixel,
                    count: graph.available_disparities(pixel).count(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let left = disparity_graph.left();
    Ok(Image::new(
        left.width(),
        left.height(),
        disparity_graph.disparity_levels() as u32,
        data,
    )?)
}
