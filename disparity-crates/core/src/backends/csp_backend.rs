use crate::basic_types::LabelingError;
use crate::create_statistics_struct;
use crate::disparity_assert_extreme;
use crate::engine::ConstraintGraph;
use crate::labeling::choose_best_node;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

create_statistics_struct!(
    /// The work done by a backend.
    BackendStatistics {
        /// The number of times the constraint graph was driven to its fixed point
        csp_solves: u64,
        /// The number of relaxation passes over the whole grid
        relaxation_rounds: u64,
        /// The number of nodes removed by relaxation
        removed_nodes: u64,
});

/// A strategy for driving a [`ConstraintGraph`] to its arc-consistent fixed point.
///
/// All backends reach the same fixed point for the same graph: the largest arc-consistent subset
/// of the available nodes is unique, and it does not depend on the order in which unsupported
/// nodes are removed.
pub trait CspBackend {
    fn name(&self) -> &'static str;

    /// Remove unsupported nodes until none are left.
    ///
    /// Returns `Ok(false)` and clears the graph if some pixel ends up without an available node.
    fn solve_csp(&mut self, graph: &mut ConstraintGraph<'_>) -> Result<bool, LabelingError>;

    /// Reduce a consistent graph to exactly one available node per pixel.
    ///
    /// Pixels are fixed one at a time in raster order, each choice followed by a full
    /// propagation.
    fn find_labeling(&mut self, graph: &mut ConstraintGraph<'_>) -> Result<(), LabelingError> {
        for pixel in graph.disparity_graph().pixels() {
            let _ = choose_best_node(graph, pixel)?;
            if !self.solve_csp(graph)? {
                return Err(LabelingError::PropagationFailed(pixel));
            }
        }

        Ok(())
    }

    fn statistics(&self) -> BackendStatistics;

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics().log(statistic_logger)
    }
}

/// Conclude a relaxation which reached its fixed point: a graph with an empty pixel is
/// inconsistent and is cleared.
pub(crate) fn conclude_relaxation(graph: &mut ConstraintGraph<'_>) -> bool {
    if graph.has_empty_pixel() {
        graph.clear();
        return false;
    }

    disparity_assert_extreme!(
        graph.count_unsupported_nodes() == 0,
        "relaxation stopped before reaching the fixed point"
    );
    true
}
