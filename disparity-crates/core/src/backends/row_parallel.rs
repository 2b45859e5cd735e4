use log::debug;
use log::trace;
use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use super::csp_backend::conclude_relaxation;
use super::BackendError;
use super::BackendStatistics;
use super::CspBackend;
use crate::basic_types::LabelingError;
use crate::engine::ConstraintGraph;

/// Relaxes the rows of the grid on a private thread pool.
///
/// Rows are statically assigned to jobs, job `j` relaxing every row `y` with `y % jobs == j`. A
/// round runs every job once and the rounds are repeated until no job removes a node.
///
/// Jobs read the availability of neighbouring rows while other jobs remove nodes from them. Such
/// a read may be stale, in which case a removal is postponed to a later round; the round which
/// ends the loop removes nothing and therefore observes the final state.
#[derive(Debug)]
pub struct RowParallel {
    pool: ThreadPool,
    num_jobs: usize,
    statistics: BackendStatistics,
}

impl RowParallel {
    /// Create the backend with `num_threads` workers, or as many as rayon picks by default.
    pub fn new(num_threads: Option<usize>) -> Result<RowParallel, BackendError> {
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|index| format!("csp-relaxation-{index}"));
        if let Some(num_threads) = num_threads {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder.build()?;
        let num_jobs = pool.current_num_threads();
        debug!("Relaxing rows with {num_jobs} jobs");

        Ok(RowParallel {
            pool,
            num_jobs,
            statistics: BackendStatistics::default(),
        })
    }

    pub fn num_jobs(&self) -> usize {
        self.num_jobs
    }

    fn relaxation_round(&self, graph: &ConstraintGraph<'_>) -> usize {
        let num_jobs = self.num_jobs;
        let height = graph.disparity_graph().height();

        self.pool.install(|| {
            (0..num_jobs)
                .into_par_iter()
                .map(|job| {
                    (job..height)
                        .step_by(num_jobs)
                        .map(|y| graph.relax_row(y))
                        .sum::<usize>()
                })
                .sum()
        })
    }
}

impl CspBackend for RowParallel {
    fn name(&self) -> &'static str {
        "row-parallel"
    }

    fn solve_csp(&mut self, graph: &mut ConstraintGraph<'_>) -> Result<bool, LabelingError> {
        self.statistics.csp_solves += 1;

        loop {
            let removed = self.relaxation_round(graph);
            self.statistics.relaxation_rounds += 1;
            self.statistics.removed_nodes += removed as u64;
            trace!("Parallel relaxation round removed {removed} nodes");

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
