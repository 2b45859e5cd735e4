use log::trace;

use super::csp_backend::conclude_relaxation;
use super::BackendStatistics;
use super::CspBackend;
use crate::basic_types::LabelingError;
use crate::engine::ConstraintGraph;

/// Relaxes the whole grid on the calling thread, one row after the other, until a pass removes
/// nothing.
#[derive(Debug, Default)]
pub struct Sequential {
    statistics: BackendStatistics,
}

impl Sequential {
    pub fn new() -> Sequential {
        Sequential::default()
    }
}

impl CspBackend for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn solve_csp(&mut self, graph: &mut ConstraintGraph<'_>) -> Result<bool, LabelingError> {
        self.statistics.csp_solves += 1;

        loop {
            let removed = graph.relaxation_iteration();
            self.statistics.relaxation_rounds += 1;
            self.statistics.removed_nodes += removed as u64;
            trace!("Sequential relaxation pass removed {removed} nodes");

            if removed == 0 {
                break;
            }
            if graph.has_empty_pixel() {
                graph.clear();
                return Ok(false);
            }
        }

        Ok(conclude_relaxation(graph))
    }

    fn statistics(&self) -> BackendStatistics {
        self.statistics
    }
}
