//! Strategies for driving a [`ConstraintGraph`](crate::engine::ConstraintGraph) to its fixed
//! point.
//!
//! - [`Sequential`] relaxes the grid on the calling thread.
//! - [`RowParallel`] relaxes disjoint rows on a thread pool.
//! - [`KernelDispatch`] launches the relaxation as kernels on a [`ComputeDevice`].
use thiserror::Error;

mod csp_backend;
mod kernel;
mod row_parallel;
mod sequential;

pub use csp_backend::BackendStatistics;
pub use csp_backend::CspBackend;
pub use kernel::BufferData;
pub use kernel::BufferHandle;
pub use kernel::ComputeDevice;
pub use kernel::DeviceError;
pub use kernel::HostDevice;
pub use kernel::KernelArgument;
pub use kernel::KernelDispatch;
pub use kernel::WorkSize;
pub use row_parallel::RowParallel;
pub use sequential::Sequential;

/// Failures while setting up a backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to build the relaxation thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
