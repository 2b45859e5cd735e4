//! Relaxation expressed as data-parallel kernels over flat buffers.
//!
//! [`KernelDispatch`] drives any [`ComputeDevice`]; [`HostDevice`] is the device which runs the
//! kernels in host memory.
mod device;
mod host_device;
mod kernel_dispatch;
mod kernels;

pub use device::BufferData;
pub use device::BufferHandle;
pub use device::ComputeDevice;
pub use device::DeviceError;
pub use device::KernelArgument;
pub use device::WorkSize;
pub use host_device::HostDevice;
pub use kernel_dispatch::KernelDispatch;
